//! Metrics Engine - descriptive statistics per parameter and per equipment type
//!
//! ## Key Features
//! - Full descriptive battery for Flowrate, Pressure and Temperature
//! - Data-quality counters (missing cells, duplicates, completeness)
//! - Per-type battery, performance index and operational threshold counts
//! - Advanced statistics: shape heuristic, Shapiro-Wilk, correlation matrix
//!   with strong-pair extraction, performance zones and parameter ratios

use crate::config::defaults::{NORMALITY_ALPHA, SHAPE_TOLERANCE};
use crate::config::{CorrelationConfig, ThresholdConfig};
use crate::data_loader::CleaningSummary;
use crate::stats::correlation::CorrelationMatrix;
use crate::stats::{self, CorrelationEngine};
use crate::types::{
    CorrelationDirection, DescriptiveStats, DistributionShape, EquipmentDataset, EquipmentRecord,
    NormalityTest, Parameter, SummaryStats,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// Basic metrics
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetrics {
    pub total_equipment_count: usize,
    pub dataset_overview: DatasetOverview,
    pub overall_stats: BTreeMap<String, DescriptiveStats>,
    pub statistical_summary: BTreeMap<String, StatisticalSummary>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub total_equipment_count: usize,
    pub equipment_types_count: usize,
}

/// The classic eight-row `describe()` table.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticalSummary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

impl From<&DescriptiveStats> for StatisticalSummary {
    fn from(s: &DescriptiveStats) -> Self {
        Self {
            count: s.count,
            mean: s.mean,
            std: s.std,
            min: s.min,
            p25: s.q25,
            p50: s.median,
            p75: s.q75,
            max: s.max,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    /// Missing cells per required column in the cleaned table.
    pub missing_values: BTreeMap<String, usize>,
    /// Exact duplicates removed while loading.
    pub duplicate_rows: usize,
    /// Non-missing cells over all cells, as a percentage.
    pub data_completeness: f64,
}

// ============================================================================
// Type metrics
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TypeMetrics {
    pub count: usize,
    /// Battery per parameter, flattened so `<Type>.<Column>.mean` resolves.
    #[serde(flatten)]
    pub parameters: BTreeMap<String, DescriptiveStats>,
    /// Average of per-parameter `type_mean / overall_mean`.
    pub performance_index: Option<f64>,
    pub operational_flags: OperationalFlags,
}

/// Records at or above the fixed operational thresholds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationalFlags {
    pub high_temperature_count: usize,
    pub high_pressure_count: usize,
    pub high_flowrate_count: usize,
}

// ============================================================================
// Advanced statistics
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AdvancedStatistics {
    pub distribution_analysis: BTreeMap<String, DistributionAnalysis>,
    pub variance_analysis: BTreeMap<String, VarianceAnalysis>,
    pub correlation_analysis: CorrelationAnalysis,
    pub performance_zones: PerformanceZones,
    pub ratio_analysis: BTreeMap<String, Option<SummaryStats>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionAnalysis {
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub normality: DistributionShape,
    pub shapiro_wilk: NormalityTest,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceAnalysis {
    pub variance: Option<f64>,
    pub std: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    pub range: f64,
    pub iqr: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationAnalysis {
    pub correlation_matrix: CorrelationMatrix,
    pub strong_correlations: Vec<StrongCorrelation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrongCorrelation {
    pub parameter_1: String,
    pub parameter_2: String,
    pub correlation: f64,
    /// "Strong" at or above the very-strong threshold, else "Moderate".
    pub strength: String,
    pub direction: CorrelationDirection,
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceZones {
    /// Flowrate and pressure both above their 75th percentile.
    pub high_performance_zone: Zone,
    /// Flowrate and pressure both below their 25th percentile.
    pub low_performance_zone: Zone,
    /// Temperature above its 75th percentile.
    pub high_temperature_zone: Zone,
    /// Every parameter inside its interquartile range.
    pub optimal_zone: Zone,
}

#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub count: usize,
    pub percentage: f64,
    pub equipment: Vec<String>,
}

pub struct MetricsEngine;

impl MetricsEngine {
    /// Dataset-wide battery plus data-quality counters.
    pub fn basic_metrics(dataset: &EquipmentDataset, cleaning: &CleaningSummary) -> SummaryMetrics {
        let n = dataset.len();
        let mut overall_stats = BTreeMap::new();
        let mut statistical_summary = BTreeMap::new();

        for parameter in Parameter::ALL {
            if let Some(s) = stats::describe(&dataset.values(parameter)) {
                debug!(column = parameter.column(), mean = s.mean, std = ?s.std, "Column statistics");
                statistical_summary.insert(parameter.column().to_string(), StatisticalSummary::from(&s));
                overall_stats.insert(parameter.column().to_string(), s);
            }
        }

        SummaryMetrics {
            total_equipment_count: n,
            dataset_overview: DatasetOverview {
                total_equipment_count: n,
                equipment_types_count: dataset.types().len(),
            },
            overall_stats,
            statistical_summary,
            data_quality: Self::data_quality(dataset, cleaning.duplicate_rows_removed),
        }
    }

    fn data_quality(dataset: &EquipmentDataset, duplicate_rows: usize) -> DataQuality {
        let missing_names = dataset.iter().filter(|r| r.name.is_none()).count();
        let missing_types = dataset.iter().filter(|r| r.equipment_type.is_none()).count();

        let mut missing_values = BTreeMap::new();
        missing_values.insert(crate::data_loader::NAME_COLUMN.to_string(), missing_names);
        missing_values.insert(crate::data_loader::TYPE_COLUMN.to_string(), missing_types);
        for parameter in Parameter::ALL {
            missing_values.insert(parameter.column().to_string(), 0);
        }

        let total_cells = dataset.len() * 5;
        let missing: usize = missing_values.values().sum();
        let data_completeness = if total_cells == 0 {
            0.0
        } else {
            (total_cells - missing) as f64 / total_cells as f64 * 100.0
        };

        DataQuality {
            missing_values,
            duplicate_rows,
            data_completeness,
        }
    }

    /// Battery per equipment type.
    pub fn type_metrics(
        dataset: &EquipmentDataset,
        thresholds: &ThresholdConfig,
    ) -> BTreeMap<String, TypeMetrics> {
        let overall_means: Vec<Option<f64>> = Parameter::ALL
            .iter()
            .map(|&p| stats::mean(&dataset.values(p)))
            .collect();

        dataset
            .by_type()
            .into_iter()
            .map(|(equipment_type, members)| {
                let mut parameters = BTreeMap::new();
                let mut ratios = Vec::new();
                for (i, parameter) in Parameter::ALL.iter().enumerate() {
                    let values: Vec<f64> = members.iter().map(|r| r.value(*parameter)).collect();
                    if let Some(s) = stats::describe(&values) {
                        if let Some(overall) = overall_means[i].filter(|m| *m != 0.0) {
                            ratios.push(s.mean / overall);
                        }
                        parameters.insert(parameter.column().to_string(), s);
                    }
                }

                let metrics = TypeMetrics {
                    count: members.len(),
                    parameters,
                    performance_index: stats::mean(&ratios),
                    operational_flags: Self::operational_flags(&members, thresholds),
                };
                (equipment_type, metrics)
            })
            .collect()
    }

    fn operational_flags(members: &[&EquipmentRecord], thresholds: &ThresholdConfig) -> OperationalFlags {
        let count = |pred: &dyn Fn(&EquipmentRecord) -> bool| members.iter().filter(|&&r| pred(r)).count();
        OperationalFlags {
            high_temperature_count: count(&|r| r.temperature >= thresholds.operational_temperature),
            high_pressure_count: count(&|r| r.pressure >= thresholds.operational_pressure),
            high_flowrate_count: count(&|r| r.flowrate >= thresholds.operational_flowrate),
        }
    }

    /// Shape, normality, variance, correlation, zones and ratios.
    pub fn advanced_statistics(
        dataset: &EquipmentDataset,
        correlation: &CorrelationConfig,
    ) -> AdvancedStatistics {
        let mut distribution_analysis = BTreeMap::new();
        let mut variance_analysis = BTreeMap::new();
        let mut described = Vec::new();

        for parameter in Parameter::ALL {
            let values = dataset.values(parameter);
            let Some(s) = stats::describe(&values) else {
                continue;
            };
            distribution_analysis.insert(
                parameter.column().to_string(),
                DistributionAnalysis {
                    skewness: s.skewness,
                    kurtosis: s.kurtosis,
                    normality: stats::classify_shape(s.skewness, s.kurtosis, SHAPE_TOLERANCE),
                    shapiro_wilk: stats::normality_test(&values, NORMALITY_ALPHA),
                },
            );
            variance_analysis.insert(
                parameter.column().to_string(),
                VarianceAnalysis {
                    variance: s.variance,
                    std: s.std,
                    coefficient_of_variation: s.coefficient_of_variation,
                    range: s.range,
                    iqr: s.iqr(),
                },
            );
            described.push((parameter, s));
        }

        AdvancedStatistics {
            distribution_analysis,
            variance_analysis,
            correlation_analysis: Self::correlation_analysis(dataset, correlation),
            performance_zones: Self::performance_zones(dataset, &described),
            ratio_analysis: Self::ratio_analysis(dataset),
        }
    }

    fn correlation_analysis(dataset: &EquipmentDataset, config: &CorrelationConfig) -> CorrelationAnalysis {
        let columns: Vec<(String, Vec<f64>)> = Parameter::ALL
            .iter()
            .map(|&p| (p.column().to_string(), dataset.values(p)))
            .collect();

        let strong_correlations = Parameter::PAIRS
            .iter()
            .filter_map(|&(a, b)| {
                let r = CorrelationEngine::pearson(&dataset.values(a), &dataset.values(b))?;
                (r.abs() >= config.strong_threshold).then(|| StrongCorrelation {
                    parameter_1: a.column().to_string(),
                    parameter_2: b.column().to_string(),
                    correlation: r,
                    strength: if r.abs() >= config.very_strong_threshold {
                        "Strong".to_string()
                    } else {
                        "Moderate".to_string()
                    },
                    direction: CorrelationDirection::from_coefficient(r),
                    p_value: CorrelationEngine::p_value_for_r(r, dataset.len()),
                })
            })
            .collect();

        CorrelationAnalysis {
            correlation_matrix: CorrelationEngine::matrix(&columns),
            strong_correlations,
        }
    }

    fn performance_zones(
        dataset: &EquipmentDataset,
        described: &[(Parameter, DescriptiveStats)],
    ) -> PerformanceZones {
        let quartiles = |p: Parameter| {
            described
                .iter()
                .find(|(param, _)| *param == p)
                .map_or((f64::NAN, f64::NAN), |(_, s)| (s.q25, s.q75))
        };
        let (f25, f75) = quartiles(Parameter::Flowrate);
        let (p25, p75) = quartiles(Parameter::Pressure);
        let (t25, t75) = quartiles(Parameter::Temperature);

        let zone = |pred: &dyn Fn(&EquipmentRecord) -> bool| {
            let equipment: Vec<String> = dataset
                .iter()
                .filter(|&r| pred(r))
                .map(|r| r.name().to_string())
                .collect();
            Zone {
                count: equipment.len(),
                percentage: percentage(equipment.len(), dataset.len()),
                equipment,
            }
        };

        PerformanceZones {
            high_performance_zone: zone(&|r| r.flowrate > f75 && r.pressure > p75),
            low_performance_zone: zone(&|r| r.flowrate < f25 && r.pressure < p25),
            high_temperature_zone: zone(&|r| r.temperature > t75),
            optimal_zone: zone(&|r| {
                (f25..=f75).contains(&r.flowrate)
                    && (p25..=p75).contains(&r.pressure)
                    && (t25..=t75).contains(&r.temperature)
            }),
        }
    }

    /// Pairwise parameter ratios; records with a zero denominator are skipped.
    fn ratio_analysis(dataset: &EquipmentDataset) -> BTreeMap<String, Option<SummaryStats>> {
        const RATIOS: [(&str, Parameter, Parameter); 3] = [
            ("flowrate_to_pressure", Parameter::Flowrate, Parameter::Pressure),
            ("temperature_to_pressure", Parameter::Temperature, Parameter::Pressure),
            ("flowrate_to_temperature", Parameter::Flowrate, Parameter::Temperature),
        ];
        RATIOS
            .iter()
            .map(|&(name, num, den)| {
                let values: Vec<f64> = dataset
                    .iter()
                    .filter(|r| r.value(den) != 0.0)
                    .map(|r| r.value(num) / r.value(den))
                    .collect();
                (name.to_string(), stats::summarize(&values))
            })
            .collect()
    }
}

/// `part / whole * 100`, 0.0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
