//! Analysis report
//!
//! The report is the committed contract with downstream consumers: thirteen
//! named sections, each a JSON-safe `serde_json::Value` tree. Engines produce
//! typed sections; the orchestrator runs each through [`value::lower`] once
//! at the boundary.

pub mod value;

use crate::data_loader::CleaningSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version stamped into `analysis_metadata`.
pub const REPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level section names in report order.
pub const SECTION_NAMES: [&str; 13] = [
    "summary_metrics",
    "type_metrics",
    "advanced_statistics",
    "performance_statistics",
    "distributions",
    "correlations",
    "high_temperature_analysis",
    "top_performers",
    "outliers",
    "efficiency",
    "comprehensive_insights",
    "dataset_info",
    "analysis_metadata",
];

/// One uploaded dataset's full analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary_metrics: Value,
    pub type_metrics: Value,
    pub advanced_statistics: Value,
    pub performance_statistics: Value,
    pub distributions: Value,
    pub correlations: Value,
    pub high_temperature_analysis: Value,
    pub top_performers: Value,
    pub outliers: Value,
    pub efficiency: Value,
    pub comprehensive_insights: Value,
    pub dataset_info: Value,
    pub analysis_metadata: Value,
}

impl AnalysisReport {
    /// Section by its top-level name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        let section = match name {
            "summary_metrics" => &self.summary_metrics,
            "type_metrics" => &self.type_metrics,
            "advanced_statistics" => &self.advanced_statistics,
            "performance_statistics" => &self.performance_statistics,
            "distributions" => &self.distributions,
            "correlations" => &self.correlations,
            "high_temperature_analysis" => &self.high_temperature_analysis,
            "top_performers" => &self.top_performers,
            "outliers" => &self.outliers,
            "efficiency" => &self.efficiency,
            "comprehensive_insights" => &self.comprehensive_insights,
            "dataset_info" => &self.dataset_info,
            "analysis_metadata" => &self.analysis_metadata,
            _ => return None,
        };
        Some(section)
    }

    /// Dotted lookup from the report root, e.g. `efficiency.rankings.overall_efficiency.0.efficiency_score`.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.').map_or((path, None), |(h, r)| (h, Some(r)));
        let section = self.section(head)?;
        match rest {
            Some(rest) => value::pointer(section, rest),
            None => Some(section),
        }
    }

    /// Number of analysed records, read back from `dataset_info`.
    pub fn equipment_count(&self) -> usize {
        value::pointer(&self.dataset_info, "cleaned_size")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default()
    }

    pub fn is_json_safe(&self) -> bool {
        SECTION_NAMES
            .iter()
            .filter_map(|name| self.section(name))
            .all(value::is_json_safe)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `dataset_info` section.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub cleaned_size: usize,
    pub original_columns: Vec<String>,
    pub cleaning: CleaningSummary,
}

/// `analysis_metadata` section.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub version: String,
    pub generated_at: String,
    pub parameters: Vec<String>,
    pub equipment_types: Vec<String>,
    pub sections: Vec<String>,
    pub configuration: crate::config::AnalyzerConfig,
}
