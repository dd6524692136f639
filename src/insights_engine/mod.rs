//! Insights Engine - distributions, correlations, flags and narrative summary
//!
//! ## Key Features
//! - Equipment count and parameter averages per type
//! - Correlation matrix over the numeric parameters and one-hot type indicators
//! - High-temperature flagging against a caller-supplied threshold
//! - Top-N records per parameter (ties keep record order)
//! - Comprehensive insights assembled from the efficiency rankings

use crate::efficiency_engine::{EfficiencyAnalysis, RankedEquipment, ScoreKind};
use crate::metrics_engine::percentage;
use crate::stats::correlation::CorrelationMatrix;
use crate::stats::{self, CorrelationEngine};
use crate::types::{
    CorrelationDirection, CorrelationStrength, EquipmentDataset, Parameter, RecordSummary,
    SummaryStats,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Fixed maintenance guidance attached to every report.
pub const RECOMMENDATIONS: [&str; 5] = [
    "Schedule preventive maintenance for equipment flagged as outliers on multiple parameters",
    "Review cooling and insulation for equipment operating above the high-temperature threshold",
    "Use the top-ranked units of each equipment type as operating benchmarks",
    "Investigate strongly correlated parameters for shared control or process dependencies",
    "Collect additional operating data to confirm trends for equipment types with few units",
];

/// Prefix of one-hot type indicator columns in the correlation matrix.
const TYPE_INDICATOR_PREFIX: &str = "Type_";

#[derive(Debug, Clone, Serialize)]
pub struct Distributions {
    pub equipment_types: BTreeMap<String, usize>,
    pub grouped_averages: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Correlations {
    pub correlation_matrix: CorrelationMatrix,
    pub key_correlations: BTreeMap<String, Option<f64>>,
    /// Type indicator vs each numeric parameter.
    pub type_correlations: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighTemperatureAnalysis {
    pub threshold: f64,
    pub count: usize,
    pub total_equipment: usize,
    pub percentage: f64,
    pub equipment_list: Vec<RecordSummary>,
    /// Statistics of the whole temperature column.
    pub temperature_stats: Option<SummaryStats>,
    pub by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsOverview {
    pub total_equipment: usize,
    pub equipment_types: usize,
    pub type_distribution: BTreeMap<String, usize>,
    pub parameters_analyzed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeInsight {
    pub count: usize,
    pub averages: BTreeMap<String, f64>,
    pub mean_efficiency: Option<f64>,
    pub performance_summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighPerformanceEquipment {
    pub best_performer: Option<RankedEquipment>,
    pub top_5: Vec<RankedEquipment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationInsight {
    pub correlation: Option<f64>,
    pub strength: Option<CorrelationStrength>,
    pub direction: Option<CorrelationDirection>,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveInsights {
    pub dataset_overview: InsightsOverview,
    pub equipment_type_analysis: BTreeMap<String, TypeInsight>,
    pub high_performance_equipment: HighPerformanceEquipment,
    pub correlation_insights: BTreeMap<String, CorrelationInsight>,
    pub recommendations: Vec<String>,
}

pub struct InsightsEngine;

impl InsightsEngine {
    pub fn type_distribution(dataset: &EquipmentDataset) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in dataset {
            *counts.entry(record.equipment_type().to_string()).or_default() += 1;
        }
        counts
    }

    /// Mean of each parameter per type.
    pub fn grouped_averages(dataset: &EquipmentDataset) -> BTreeMap<String, BTreeMap<String, f64>> {
        dataset
            .by_type()
            .into_iter()
            .map(|(equipment_type, members)| {
                let averages = Parameter::ALL
                    .iter()
                    .filter_map(|&p| {
                        let values: Vec<f64> = members.iter().map(|r| r.value(p)).collect();
                        stats::mean(&values).map(|m| (p.column().to_string(), m))
                    })
                    .collect();
                (equipment_type, averages)
            })
            .collect()
    }

    pub fn distributions(dataset: &EquipmentDataset) -> Distributions {
        Distributions {
            equipment_types: Self::type_distribution(dataset),
            grouped_averages: Self::grouped_averages(dataset),
        }
    }

    /// `flowrate_temperature`-style key for a parameter pair.
    pub fn pair_key(a: Parameter, b: Parameter) -> String {
        format!("{}_{}", a.key(), b.key())
    }

    pub fn correlations(dataset: &EquipmentDataset) -> Correlations {
        let numeric: Vec<(String, Vec<f64>)> = Parameter::ALL
            .iter()
            .map(|&p| (p.column().to_string(), dataset.values(p)))
            .collect();

        let indicators: Vec<(String, Vec<f64>)> = dataset
            .types()
            .into_iter()
            .map(|t| {
                let column = dataset
                    .iter()
                    .map(|r| if r.equipment_type() == t { 1.0 } else { 0.0 })
                    .collect();
                (t, column)
            })
            .collect();

        let mut columns = numeric.clone();
        columns.extend(
            indicators
                .iter()
                .map(|(t, v)| (format!("{TYPE_INDICATOR_PREFIX}{t}"), v.clone())),
        );

        let key_correlations = Parameter::PAIRS
            .iter()
            .map(|&(a, b)| {
                (
                    Self::pair_key(a, b),
                    CorrelationEngine::pearson(&dataset.values(a), &dataset.values(b)),
                )
            })
            .collect();

        let type_correlations = indicators
            .iter()
            .map(|(t, indicator)| {
                let row = numeric
                    .iter()
                    .map(|(name, values)| (name.clone(), CorrelationEngine::pearson(indicator, values)))
                    .collect();
                (t.clone(), row)
            })
            .collect();

        Correlations {
            correlation_matrix: CorrelationEngine::matrix(&columns),
            key_correlations,
            type_correlations,
        }
    }

    /// Records with temperature at or above `threshold`, in record order.
    pub fn high_temperature(dataset: &EquipmentDataset, threshold: f64) -> HighTemperatureAnalysis {
        let hot: Vec<RecordSummary> = dataset
            .iter()
            .filter(|r| r.temperature >= threshold)
            .map(RecordSummary::from)
            .collect();

        let mut by_type = BTreeMap::new();
        for record in &hot {
            *by_type.entry(record.equipment_type.clone()).or_default() += 1;
        }
        debug!(threshold, count = hot.len(), "High-temperature equipment");

        HighTemperatureAnalysis {
            threshold,
            count: hot.len(),
            total_equipment: dataset.len(),
            percentage: percentage(hot.len(), dataset.len()),
            equipment_list: hot,
            temperature_stats: stats::summarize(&dataset.values(Parameter::Temperature)),
            by_type,
        }
    }

    /// Largest `n` records per parameter. Ties keep record order.
    pub fn top_performers(dataset: &EquipmentDataset, n: usize) -> BTreeMap<String, Vec<RecordSummary>> {
        Parameter::ALL
            .iter()
            .map(|&p| {
                let mut order: Vec<usize> = (0..dataset.len()).collect();
                let records = dataset.records();
                order.sort_by(|&a, &b| records[b].value(p).total_cmp(&records[a].value(p)));
                let top = order
                    .into_iter()
                    .take(n)
                    .map(|i| RecordSummary::from(&records[i]))
                    .collect();
                (p.column().to_string(), top)
            })
            .collect()
    }

    /// Narrative summary over the dataset and its efficiency analysis.
    pub fn comprehensive_insights(
        dataset: &EquipmentDataset,
        efficiency: &EfficiencyAnalysis,
        top_n: usize,
    ) -> ComprehensiveInsights {
        let type_distribution = Self::type_distribution(dataset);
        let averages = Self::grouped_averages(dataset);

        let equipment_type_analysis = averages
            .into_iter()
            .map(|(equipment_type, averages)| {
                let count = type_distribution.get(&equipment_type).copied().unwrap_or_default();
                let mean_efficiency = efficiency
                    .by_type
                    .get(&equipment_type)
                    .and_then(|t| t.efficiency_metrics.get(ScoreKind::OverallEfficiency.key()))
                    .and_then(|m| m.as_ref().map(|s| s.mean));
                let performance_summary =
                    Self::performance_summary(&equipment_type, count, &averages, mean_efficiency);
                (
                    equipment_type,
                    TypeInsight {
                        count,
                        averages,
                        mean_efficiency,
                        performance_summary,
                    },
                )
            })
            .collect();

        let ranking = efficiency
            .rankings
            .get(ScoreKind::OverallEfficiency.key())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let correlation_insights = Parameter::PAIRS
            .iter()
            .map(|&(a, b)| {
                let r = CorrelationEngine::pearson(&dataset.values(a), &dataset.values(b));
                (Self::pair_key(a, b), Self::interpret(a, b, r))
            })
            .collect();

        ComprehensiveInsights {
            dataset_overview: InsightsOverview {
                total_equipment: dataset.len(),
                equipment_types: type_distribution.len(),
                type_distribution,
                parameters_analyzed: Parameter::ALL.iter().map(|p| p.column().to_string()).collect(),
            },
            equipment_type_analysis,
            high_performance_equipment: HighPerformanceEquipment {
                best_performer: ranking.first().cloned(),
                top_5: ranking.iter().take(top_n).cloned().collect(),
            },
            correlation_insights,
            recommendations: RECOMMENDATIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn performance_summary(
        equipment_type: &str,
        count: usize,
        averages: &BTreeMap<String, f64>,
        mean_efficiency: Option<f64>,
    ) -> String {
        let avg = |p: Parameter| averages.get(p.column()).copied().unwrap_or_default();
        let units = if count == 1 { "unit" } else { "units" };
        let mut summary = format!(
            "{equipment_type}: {count} {units}, avg flowrate {:.2}, avg pressure {:.2}, avg temperature {:.2}",
            avg(Parameter::Flowrate),
            avg(Parameter::Pressure),
            avg(Parameter::Temperature),
        );
        if let Some(e) = mean_efficiency {
            summary.push_str(&format!(", mean efficiency {e:.3}"));
        }
        summary
    }

    fn interpret(a: Parameter, b: Parameter, r: Option<f64>) -> CorrelationInsight {
        match r {
            Some(r) => {
                let strength = CorrelationStrength::from_coefficient(r);
                let direction = CorrelationDirection::from_coefficient(r);
                CorrelationInsight {
                    correlation: Some(r),
                    strength: Some(strength),
                    direction: Some(direction),
                    interpretation: format!(
                        "{strength} {} correlation between {a} and {b} (r = {r:.3})",
                        direction.to_string().to_lowercase()
                    ),
                }
            }
            None => CorrelationInsight {
                correlation: None,
                strength: None,
                direction: None,
                interpretation: format!("Correlation between {a} and {b} is undefined (constant values)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efficiency_engine::EfficiencyEngine;
    use crate::types::EquipmentRecord;

    fn sample() -> EquipmentDataset {
        EquipmentDataset::new(vec![
            EquipmentRecord::new("P1", "Pump", 100.0, 5.0, 70.0),
            EquipmentRecord::new("C1", "Compressor", 50.0, 9.0, 60.0),
            EquipmentRecord::new("P2", "Pump", 150.0, 6.0, 110.0),
            EquipmentRecord::new("R1", "Reactor", 90.0, 8.0, 150.0),
            EquipmentRecord::new("P3", "Pump", 150.0, 4.0, 100.0),
        ])
    }

    #[test]
    fn test_distribution_and_averages() {
        let d = InsightsEngine::distributions(&sample());
        assert_eq!(d.equipment_types["Pump"], 3);
        assert_eq!(d.equipment_types["Reactor"], 1);
        assert!((d.grouped_averages["Pump"]["Flowrate"] - 400.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_temperature_inclusive_threshold() {
        let h = InsightsEngine::high_temperature(&sample(), 100.0);
        assert_eq!(h.count, 3);
        assert_eq!(h.total_equipment, 5);
        assert!((h.percentage - 60.0).abs() < 1e-9);
        let names: Vec<&str> = h.equipment_list.iter().map(|r| r.equipment_name.as_str()).collect();
        assert_eq!(names, vec!["P2", "R1", "P3"]);
        assert_eq!(h.by_type["Pump"], 2);
    }

    #[test]
    fn test_top_performers_ties_keep_order() {
        let top = InsightsEngine::top_performers(&sample(), 2);
        let names: Vec<&str> = top["Flowrate"].iter().map(|r| r.equipment_name.as_str()).collect();
        assert_eq!(names, vec!["P2", "P3"]);
        assert_eq!(top["Temperature"][0].equipment_name, "R1");
    }

    #[test]
    fn test_one_hot_correlations() {
        let c = InsightsEngine::correlations(&sample());
        assert!(c.correlation_matrix.contains_key("Type_Pump"));
        assert_eq!(c.correlation_matrix["Type_Pump"]["Type_Pump"], Some(1.0));
        assert_eq!(c.key_correlations.len(), 3);
        assert!(c.key_correlations.contains_key("flowrate_temperature"));
        assert!(c.type_correlations["Reactor"]["Temperature"].unwrap() > 0.0);
    }

    #[test]
    fn test_single_type_indicator_is_undefined() {
        let ds = EquipmentDataset::new(vec![
            EquipmentRecord::new("A", "Pump", 1.0, 2.0, 3.0),
            EquipmentRecord::new("B", "Pump", 2.0, 3.0, 5.0),
        ]);
        let c = InsightsEngine::correlations(&ds);
        assert!(c.type_correlations["Pump"]["Flowrate"].is_none());
        assert!(c.correlation_matrix["Type_Pump"].values().all(Option::is_none));
        assert_eq!(c.correlation_matrix["Flowrate"]["Flowrate"], Some(1.0));
    }

    #[test]
    fn test_comprehensive_insights() {
        let ds = sample();
        let scored = EfficiencyEngine::score(&ds).unwrap();
        let efficiency = EfficiencyEngine::analyze(&scored);
        let insights = InsightsEngine::comprehensive_insights(&ds, &efficiency, 5);

        assert_eq!(insights.dataset_overview.total_equipment, 5);
        assert_eq!(insights.dataset_overview.equipment_types, 3);
        assert_eq!(insights.recommendations.len(), 5);
        assert_eq!(insights.high_performance_equipment.top_5.len(), 5);
        let best = insights.high_performance_equipment.best_performer.as_ref().unwrap();
        assert_eq!(best.rank, 1);
        assert!(insights.equipment_type_analysis["Reactor"]
            .performance_summary
            .starts_with("Reactor: 1 unit,"));
        let ft = &insights.correlation_insights["flowrate_temperature"];
        assert!(ft.strength.is_some());
        assert!(ft.interpretation.contains("Flowrate"));
    }
}
