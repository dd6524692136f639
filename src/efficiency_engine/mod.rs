//! Efficiency Engine - normalization, four composite scores, rankings
//!
//! ## Architecture
//!
//! ```text
//! EquipmentDataset ──▶ NormalizedView (min-max / z / robust)
//!                          │
//!                          ▼
//!                  EquipmentScores per record (scoring.rs)
//!                          │
//!          ┌───────────────┼─────────────────┐
//!          ▼               ▼                 ▼
//!      rankings       by_type breakdown   type_ranking
//! ```
//!
//! Only the min-max values feed the scores; the Z-score and robust scalings
//! are reported under `normalization` for reference.

pub mod normalization;
pub mod scoring;

pub use normalization::{ColumnNormalization, ColumnScaling, NormalizedView, ScaledValue};
pub use scoring::{EquipmentScores, ScoreKind, Term, WeightProfile};

use crate::stats::{self, CorrelationEngine};
use crate::types::{EquipmentDataset, EquipmentRecord, Parameter, RecordSummary, SummaryStats};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

// ============================================================================
// Scored dataset
// ============================================================================

/// Dataset plus its normalized view and per-record scores, same order.
#[derive(Debug, Clone)]
pub struct ScoredDataset<'a> {
    pub dataset: &'a EquipmentDataset,
    pub view: NormalizedView,
    pub scores: Vec<EquipmentScores>,
}

impl ScoredDataset<'_> {
    fn column(&self, kind: ScoreKind) -> Vec<f64> {
        self.scores.iter().map(|s| s.get(kind)).collect()
    }

    fn min_max(&self, row: usize) -> [f64; 3] {
        self.view.min_max(row).unwrap_or_default()
    }
}

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedValues {
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEquipment {
    pub rank: usize,
    #[serde(flatten)]
    pub record: RecordSummary,
    #[serde(flatten)]
    pub scores: EquipmentScores,
    pub normalized: NormalizedValues,
}

/// Score distribution within one type, split at that type's quartiles.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreDistribution {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub high_performers: usize,
    pub medium_performers: usize,
    pub low_performers: usize,
    pub coefficient_of_variation: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationalCharacteristic {
    pub mean: f64,
    /// Type mean over dataset mean; `None` when the dataset mean is zero.
    pub ratio_to_overall: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub coefficient_of_variation: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPerformer {
    #[serde(flatten)]
    pub record: RecordSummary,
    pub efficiency_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeEfficiency {
    pub count: usize,
    pub efficiency_metrics: BTreeMap<String, Option<SummaryStats>>,
    pub top_performer: Option<TopPerformer>,
    pub distribution: Option<ScoreDistribution>,
    pub operational_characteristics: BTreeMap<String, OperationalCharacteristic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeRank {
    pub rank: usize,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub mean_efficiency: f64,
    pub count: usize,
    pub percentile: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyAnalysis {
    /// One ranking per score, keyed by [`ScoreKind::key`].
    pub rankings: BTreeMap<String, Vec<RankedEquipment>>,
    pub by_type: BTreeMap<String, TypeEfficiency>,
    pub type_ranking: Vec<TypeRank>,
    pub normalization: BTreeMap<String, ColumnNormalization>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStatistics {
    pub score_summaries: BTreeMap<String, Option<SummaryStats>>,
    /// Pearson r between each pair of scores; `None` when a score is constant.
    pub score_agreement: BTreeMap<String, Option<f64>>,
}

// ============================================================================
// Engine
// ============================================================================

pub struct EfficiencyEngine;

impl EfficiencyEngine {
    /// Normalize and score every record. `None` only for an empty dataset.
    pub fn score(dataset: &EquipmentDataset) -> Option<ScoredDataset<'_>> {
        let view = NormalizedView::build(dataset)?;
        let scores = dataset
            .iter()
            .enumerate()
            .map(|(i, record)| {
                EquipmentScores::compute(view.min_max(i).unwrap_or_default(), record.equipment_type())
            })
            .collect();
        Some(ScoredDataset {
            dataset,
            view,
            scores,
        })
    }

    /// Rankings, per-type breakdown, type ranking and normalization report.
    pub fn analyze(scored: &ScoredDataset<'_>) -> EfficiencyAnalysis {
        let rankings = ScoreKind::ALL
            .iter()
            .map(|&kind| (kind.key().to_string(), Self::rank_by(scored, kind)))
            .collect();
        let by_type = Self::by_type(scored);
        let type_ranking = Self::type_ranking(scored);

        if let Some(best) = type_ranking.first() {
            info!(
                equipment = scored.dataset.len(),
                types = type_ranking.len(),
                best_type = %best.equipment_type,
                best_mean = best.mean_efficiency,
                "Efficiency scoring complete"
            );
        }

        EfficiencyAnalysis {
            rankings,
            by_type,
            type_ranking,
            normalization: normalization::normalization_report(scored.dataset, &scored.view),
        }
    }

    /// Stable descending sort on one score, ranks 1..=n.
    pub fn rank_by(scored: &ScoredDataset<'_>, kind: ScoreKind) -> Vec<RankedEquipment> {
        let mut order: Vec<usize> = (0..scored.scores.len()).collect();
        order.sort_by(|&a, &b| scored.scores[b].get(kind).total_cmp(&scored.scores[a].get(kind)));

        order
            .into_iter()
            .enumerate()
            .map(|(pos, i)| {
                let [f, p, t] = scored.min_max(i);
                RankedEquipment {
                    rank: pos + 1,
                    record: RecordSummary::from(&scored.dataset.records()[i]),
                    scores: scored.scores[i],
                    normalized: NormalizedValues {
                        flowrate: f,
                        pressure: p,
                        temperature: t,
                    },
                }
            })
            .collect()
    }

    /// Record positions grouped by type, in order of first appearance.
    fn groups(dataset: &EquipmentDataset) -> Vec<(String, Vec<usize>)> {
        dataset
            .types()
            .into_iter()
            .map(|t| {
                let members = dataset
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.equipment_type() == t)
                    .map(|(i, _)| i)
                    .collect();
                (t, members)
            })
            .collect()
    }

    fn by_type(scored: &ScoredDataset<'_>) -> BTreeMap<String, TypeEfficiency> {
        let records = scored.dataset.records();
        let overall_means: Vec<Option<f64>> = Parameter::ALL
            .iter()
            .map(|&p| stats::mean(&scored.dataset.values(p)))
            .collect();

        Self::groups(scored.dataset)
            .into_iter()
            .map(|(equipment_type, members)| {
                let efficiency_metrics = ScoreKind::ALL
                    .iter()
                    .map(|&kind| {
                        let values: Vec<f64> = members.iter().map(|&i| scored.scores[i].get(kind)).collect();
                        (kind.key().to_string(), stats::summarize(&values))
                    })
                    .collect();

                // First maximum wins ties
                let top_performer = members
                    .iter()
                    .copied()
                    .reduce(|best, i| {
                        if scored.scores[i].efficiency_score > scored.scores[best].efficiency_score {
                            i
                        } else {
                            best
                        }
                    })
                    .map(|i| TopPerformer {
                        record: RecordSummary::from(&records[i]),
                        efficiency_score: scored.scores[i].efficiency_score,
                    });

                let efficiency: Vec<f64> = members.iter().map(|&i| scored.scores[i].efficiency_score).collect();
                let member_records: Vec<&EquipmentRecord> = members.iter().map(|&i| &records[i]).collect();

                debug!(equipment_type = %equipment_type, count = members.len(), "Type efficiency");
                let breakdown = TypeEfficiency {
                    count: members.len(),
                    efficiency_metrics,
                    top_performer,
                    distribution: Self::distribution(&efficiency),
                    operational_characteristics: Self::operational_characteristics(&member_records, &overall_means),
                };
                (equipment_type, breakdown)
            })
            .collect()
    }

    fn distribution(efficiency: &[f64]) -> Option<ScoreDistribution> {
        let s = stats::describe(efficiency)?;
        let high = efficiency.iter().filter(|&&v| v > s.q75).count();
        let low = efficiency.iter().filter(|&&v| v < s.q25).count();
        Some(ScoreDistribution {
            q1: s.q25,
            median: s.median,
            q3: s.q75,
            high_performers: high,
            medium_performers: efficiency.len() - high - low,
            low_performers: low,
            coefficient_of_variation: s.coefficient_of_variation,
            skewness: s.skewness,
            kurtosis: s.kurtosis,
        })
    }

    fn operational_characteristics(
        members: &[&EquipmentRecord],
        overall_means: &[Option<f64>],
    ) -> BTreeMap<String, OperationalCharacteristic> {
        Parameter::ALL
            .iter()
            .filter_map(|&parameter| {
                let values: Vec<f64> = members.iter().map(|r| r.value(parameter)).collect();
                let s = stats::describe(&values)?;
                let ratio_to_overall = overall_means[parameter.index()]
                    .filter(|m| *m != 0.0)
                    .map(|m| s.mean / m);
                Some((
                    parameter.column().to_string(),
                    OperationalCharacteristic {
                        mean: s.mean,
                        ratio_to_overall,
                        min: s.min,
                        max: s.max,
                        range: s.range,
                        coefficient_of_variation: s.coefficient_of_variation,
                    },
                ))
            })
            .collect()
    }

    /// Types by mean efficiency score, descending; ties keep first appearance.
    pub fn type_ranking(scored: &ScoredDataset<'_>) -> Vec<TypeRank> {
        let mut means: Vec<(String, f64, usize)> = Self::groups(scored.dataset)
            .into_iter()
            .filter_map(|(equipment_type, members)| {
                let values: Vec<f64> = members.iter().map(|&i| scored.scores[i].efficiency_score).collect();
                stats::mean(&values).map(|m| (equipment_type, m, members.len()))
            })
            .collect();
        means.sort_by(|a, b| b.1.total_cmp(&a.1));

        let n = means.len();
        means
            .into_iter()
            .enumerate()
            .map(|(pos, (equipment_type, mean_efficiency, count))| {
                let rank = pos + 1;
                let percentile = if n <= 1 {
                    100.0
                } else {
                    100.0 * (n - rank) as f64 / (n - 1) as f64
                };
                TypeRank {
                    rank,
                    equipment_type,
                    mean_efficiency,
                    count,
                    percentile,
                }
            })
            .collect()
    }

    /// Summary of every score plus pairwise agreement between scores.
    pub fn performance_statistics(scored: &ScoredDataset<'_>) -> PerformanceStatistics {
        let columns: Vec<(ScoreKind, Vec<f64>)> = ScoreKind::ALL
            .iter()
            .map(|&kind| (kind, scored.column(kind)))
            .collect();

        let score_summaries = columns
            .iter()
            .map(|(kind, values)| (kind.key().to_string(), stats::summarize(values)))
            .collect();

        let mut score_agreement = BTreeMap::new();
        for (i, (a, xs)) in columns.iter().enumerate() {
            for (b, ys) in &columns[i + 1..] {
                score_agreement.insert(
                    format!("{}_vs_{}", a.key(), b.key()),
                    CorrelationEngine::pearson(xs, ys),
                );
            }
        }

        PerformanceStatistics {
            score_summaries,
            score_agreement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EquipmentDataset {
        EquipmentDataset::new(vec![
            EquipmentRecord::new("P1", "Pump", 100.0, 5.0, 70.0),
            EquipmentRecord::new("P2", "Pump", 150.0, 7.5, 125.0),
            EquipmentRecord::new("C1", "Compressor", 50.0, 9.0, 60.0),
            EquipmentRecord::new("C2", "Compressor", 60.0, 8.0, 65.0),
            EquipmentRecord::new("H1", "HeatExchanger", 120.0, 4.0, 130.0),
            EquipmentRecord::new("V1", "Valve", 80.0, 6.0, 90.0),
        ])
    }

    #[test]
    fn test_rankings_are_permutation_and_non_increasing() {
        let ds = sample();
        let scored = EfficiencyEngine::score(&ds).unwrap();
        for kind in ScoreKind::ALL {
            let ranking = EfficiencyEngine::rank_by(&scored, kind);
            let ranks: Vec<usize> = ranking.iter().map(|r| r.rank).collect();
            assert_eq!(ranks, (1..=ds.len()).collect::<Vec<_>>());
            assert!(ranking
                .windows(2)
                .all(|w| w[0].scores.get(kind) >= w[1].scores.get(kind)));
        }
    }

    #[test]
    fn test_ties_keep_record_order() {
        let ds = EquipmentDataset::new(vec![
            EquipmentRecord::new("A", "Pump", 1.0, 1.0, 1.0),
            EquipmentRecord::new("B", "Pump", 2.0, 2.0, 2.0),
            EquipmentRecord::new("C", "Pump", 1.0, 1.0, 1.0),
        ]);
        // A and C score identically; C is a different record only by name
        let scored = EfficiencyEngine::score(&ds).unwrap();
        let ranking = EfficiencyEngine::rank_by(&scored, ScoreKind::OverallEfficiency);
        let names: Vec<&str> = ranking.iter().map(|r| r.record.equipment_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_by_type_top_performer_and_distribution() {
        let ds = sample();
        let scored = EfficiencyEngine::score(&ds).unwrap();
        let analysis = EfficiencyEngine::analyze(&scored);
        let pump = &analysis.by_type["Pump"];
        assert_eq!(pump.count, 2);
        let best = if scored.scores[1].efficiency_score > scored.scores[0].efficiency_score { "P2" } else { "P1" };
        assert_eq!(pump.top_performer.as_ref().unwrap().record.equipment_name, best);

        let valve = &analysis.by_type["Valve"];
        let dist = valve.distribution.as_ref().unwrap();
        assert_eq!(dist.medium_performers, 1);
        assert!(valve.efficiency_metrics["overall_efficiency"].as_ref().unwrap().std.is_none());
    }

    #[test]
    fn test_type_ranking_percentiles() {
        let ds = sample();
        let scored = EfficiencyEngine::score(&ds).unwrap();
        let ranking = EfficiencyEngine::type_ranking(&scored);
        assert_eq!(ranking.len(), 4);
        assert_eq!(ranking[0].percentile, 100.0);
        assert_eq!(ranking[3].percentile, 0.0);
        assert!(ranking.windows(2).all(|w| w[0].mean_efficiency >= w[1].mean_efficiency));
    }

    #[test]
    fn test_single_record_is_degenerate_but_scored() {
        let ds = EquipmentDataset::new(vec![EquipmentRecord::new("X", "Pump", 1.0, 2.0, 3.0)]);
        let scored = EfficiencyEngine::score(&ds).unwrap();
        let s = scored.scores[0];
        // All normalized values are 0.0
        assert!((s.efficiency_score - 0.3 * 0.3).abs() < 1e-12);
        let analysis = EfficiencyEngine::analyze(&scored);
        assert_eq!(analysis.type_ranking[0].percentile, 100.0);
        let perf = EfficiencyEngine::performance_statistics(&scored);
        assert!(perf.score_agreement.values().all(Option::is_none));
        assert_eq!(perf.score_agreement.len(), 6);
    }
}
