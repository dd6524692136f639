//! Outlier Engine - IQR fences, Z-scores and their consensus
//!
//! ## Key Features
//! - IQR method: `[Q1 - k·IQR, Q3 + k·IQR]`, values on a fence are inliers
//! - Z-score method: `|x - mean| / std > threshold`, sample std
//! - Consensus per column: records flagged by both methods
//! - Pattern analysis over IQR results: multi-parameter outliers, per-type counts
//!
//! Both detectors run over the whole dataset, not per type. The IQR method is
//! the primary signal for pattern analysis; Z-scores only feed the consensus.

use crate::config::OutlierConfig;
use crate::metrics_engine::percentage;
use crate::stats;
use crate::types::{EquipmentDataset, Parameter, RecordSummary};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationType {
    Low,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdInfo {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IqrStatistics {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub median: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IqrOutlier {
    #[serde(flatten)]
    pub record: RecordSummary,
    pub value: f64,
    pub deviation_type: DeviationType,
}

#[derive(Debug, Clone, Serialize)]
pub struct IqrAnalysis {
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub normal_range: String,
    pub threshold_info: ThresholdInfo,
    pub outliers: Vec<IqrOutlier>,
    pub statistics: IqrStatistics,
    /// Record positions of `outliers`, same order.
    #[serde(skip)]
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZScoreOutlier {
    #[serde(flatten)]
    pub record: RecordSummary,
    pub value: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZScoreAnalysis {
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub threshold: f64,
    pub mean: f64,
    pub std: Option<f64>,
    pub outliers: Vec<ZScoreOutlier>,
    /// Set when the column has no spread and no score could be computed.
    pub message: Option<String>,
    #[serde(skip)]
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsensusOutliers {
    pub count: usize,
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiParameterOutlier {
    pub equipment_name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub parameters: Vec<String>,
    pub outlier_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub total_outlier_equipment: usize,
    pub single_parameter_outliers: usize,
    pub multi_parameter_outliers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternAnalysis {
    pub multi_parameter_outliers: Vec<MultiParameterOutlier>,
    /// Distinct outlier records per equipment type.
    pub outliers_by_type: BTreeMap<String, usize>,
    pub summary: PatternSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierAnalysis {
    pub basic_analysis: BTreeMap<String, IqrAnalysis>,
    pub zscore_analysis: BTreeMap<String, ZScoreAnalysis>,
    pub consensus_outliers: BTreeMap<String, ConsensusOutliers>,
    pub pattern_analysis: PatternAnalysis,
}

pub struct OutlierEngine;

impl OutlierEngine {
    /// Run both detectors on every parameter and reconcile them.
    pub fn analyze(dataset: &EquipmentDataset, config: &OutlierConfig) -> OutlierAnalysis {
        let mut basic_analysis = BTreeMap::new();
        let mut zscore_analysis = BTreeMap::new();
        let mut consensus_outliers = BTreeMap::new();
        let mut flagged: Vec<(Parameter, Vec<usize>)> = Vec::new();

        for parameter in Parameter::ALL {
            let Some(iqr) = Self::iqr_outliers(dataset, parameter, config.iqr_multiplier) else {
                continue;
            };
            let Some(z) = Self::zscore_outliers(dataset, parameter, config.z_score_threshold) else {
                continue;
            };

            let consensus = Self::consensus(dataset, &iqr, &z);
            debug!(
                column = parameter.column(),
                iqr = iqr.outlier_count,
                zscore = z.outlier_count,
                consensus = consensus.count,
                "Outlier detection"
            );

            flagged.push((parameter, iqr.indices.clone()));
            basic_analysis.insert(parameter.column().to_string(), iqr);
            zscore_analysis.insert(parameter.column().to_string(), z);
            consensus_outliers.insert(parameter.column().to_string(), consensus);
        }

        let pattern_analysis = Self::pattern_analysis(dataset, &flagged);
        info!(
            outlier_equipment = pattern_analysis.summary.total_outlier_equipment,
            multi_parameter = pattern_analysis.summary.multi_parameter_outliers,
            "Outlier analysis complete"
        );

        OutlierAnalysis {
            basic_analysis,
            zscore_analysis,
            consensus_outliers,
            pattern_analysis,
        }
    }

    /// IQR fences for one parameter. `None` only for an empty dataset.
    pub fn iqr_outliers(
        dataset: &EquipmentDataset,
        parameter: Parameter,
        multiplier: f64,
    ) -> Option<IqrAnalysis> {
        let values = dataset.values(parameter);
        let sorted = stats::sorted(&values);
        let q1 = stats::percentile(&sorted, 0.25)?;
        let q3 = stats::percentile(&sorted, 0.75)?;
        let median = stats::percentile(&sorted, 0.5)?;
        let mean = stats::mean(&values)?;
        let iqr = q3 - q1;
        let lower_bound = q1 - multiplier * iqr;
        let upper_bound = q3 + multiplier * iqr;

        let mut outliers = Vec::new();
        let mut indices = Vec::new();
        for (i, record) in dataset.iter().enumerate() {
            let value = record.value(parameter);
            let deviation_type = if value < lower_bound {
                DeviationType::Low
            } else if value > upper_bound {
                DeviationType::High
            } else {
                continue;
            };
            indices.push(i);
            outliers.push(IqrOutlier {
                record: RecordSummary::from(record),
                value,
                deviation_type,
            });
        }

        Some(IqrAnalysis {
            outlier_count: outliers.len(),
            outlier_percentage: percentage(outliers.len(), dataset.len()),
            normal_range: format!("{lower_bound:.2} - {upper_bound:.2}"),
            threshold_info: ThresholdInfo {
                lower_bound,
                upper_bound,
                multiplier,
            },
            outliers,
            statistics: IqrStatistics {
                q1,
                q3,
                iqr,
                median,
                mean,
            },
            indices,
        })
    }

    /// Z-score detector for one parameter. `None` only for an empty dataset.
    pub fn zscore_outliers(
        dataset: &EquipmentDataset,
        parameter: Parameter,
        threshold: f64,
    ) -> Option<ZScoreAnalysis> {
        let values = dataset.values(parameter);
        let mean = stats::mean(&values)?;
        let std = stats::descriptive::sample_std(&values);

        let mut analysis = ZScoreAnalysis {
            outlier_count: 0,
            outlier_percentage: 0.0,
            threshold,
            mean,
            std,
            outliers: Vec::new(),
            message: None,
            indices: Vec::new(),
        };

        let std = match std {
            Some(s) if s > 0.0 => s,
            Some(_) => {
                warn!(column = parameter.column(), "Zero standard deviation, Z-scores undefined");
                analysis.message = Some(format!(
                    "{} has zero standard deviation; no Z-score outliers reported",
                    parameter.column()
                ));
                return Some(analysis);
            }
            None => {
                analysis.message = Some(format!(
                    "{} has too few values for a standard deviation; no Z-score outliers reported",
                    parameter.column()
                ));
                return Some(analysis);
            }
        };

        for (i, record) in dataset.iter().enumerate() {
            let value = record.value(parameter);
            let z_score = (value - mean).abs() / std;
            if z_score > threshold {
                analysis.indices.push(i);
                analysis.outliers.push(ZScoreOutlier {
                    record: RecordSummary::from(record),
                    value,
                    z_score,
                });
            }
        }
        analysis.outlier_count = analysis.outliers.len();
        analysis.outlier_percentage = percentage(analysis.outlier_count, dataset.len());
        Some(analysis)
    }

    /// Records flagged by both methods, in IQR order.
    pub fn consensus(dataset: &EquipmentDataset, iqr: &IqrAnalysis, z: &ZScoreAnalysis) -> ConsensusOutliers {
        let z_set: HashSet<usize> = z.indices.iter().copied().collect();
        let equipment: Vec<String> = iqr
            .indices
            .iter()
            .filter(|i| z_set.contains(i))
            .map(|&i| dataset.records()[i].name().to_string())
            .collect();
        ConsensusOutliers {
            count: equipment.len(),
            equipment,
        }
    }

    fn pattern_analysis(dataset: &EquipmentDataset, flagged: &[(Parameter, Vec<usize>)]) -> PatternAnalysis {
        // Record position -> parameters it is an outlier on
        let mut per_record: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (parameter, indices) in flagged {
            for &i in indices {
                per_record
                    .entry(i)
                    .or_default()
                    .push(parameter.column().to_string());
            }
        }

        let mut outliers_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut multi_parameter_outliers = Vec::new();
        for (&i, parameters) in &per_record {
            let record = &dataset.records()[i];
            *outliers_by_type
                .entry(record.equipment_type().to_string())
                .or_default() += 1;
            if parameters.len() > 1 {
                multi_parameter_outliers.push(MultiParameterOutlier {
                    equipment_name: record.name().to_string(),
                    equipment_type: record.equipment_type().to_string(),
                    outlier_count: parameters.len(),
                    parameters: parameters.clone(),
                });
            }
        }

        PatternAnalysis {
            summary: PatternSummary {
                total_outlier_equipment: per_record.len(),
                single_parameter_outliers: per_record.len() - multi_parameter_outliers.len(),
                multi_parameter_outliers: multi_parameter_outliers.len(),
            },
            multi_parameter_outliers,
            outliers_by_type,
        }
    }
}
