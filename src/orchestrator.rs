//! Analysis Orchestrator
//!
//! Runs the full pipeline for one upload:
//!
//! ```text
//! CSV bytes ─▶ DataLoader ─▶ EquipmentDataset
//!                               │
//!        ┌──────────┬───────────┼────────────┬──────────────┐
//!        ▼          ▼           ▼            ▼              ▼
//!     metrics   outliers    efficiency   insights     (metadata)
//!        └──────────┴───────────┴────────────┴──────────────┘
//!                               │
//!                               ▼
//!              lower to serde_json::Value ─▶ AnalysisReport
//! ```
//!
//! A failing stage fails the whole call; no partial report is returned.

use crate::config::defaults::TOP_PERFORMER_COUNT;
use crate::config::{self, AnalyzerConfig, ConfigError};
use crate::data_loader::{CleaningSummary, DataLoader, LoadedDataset};
use crate::efficiency_engine::EfficiencyEngine;
use crate::error::AnalysisError;
use crate::insights_engine::InsightsEngine;
use crate::metrics_engine::MetricsEngine;
use crate::outlier_engine::OutlierEngine;
use crate::report::{value, AnalysisMetadata, AnalysisReport, DatasetInfo, REPORT_VERSION, SECTION_NAMES};
use crate::types::{EquipmentDataset, Parameter};
use serde::Serialize;
use std::io::Read;
use std::time::Instant;
use tracing::{debug, info};

/// Runs every engine against one cleaned dataset and assembles the report.
#[derive(Debug, Clone)]
pub struct EquipmentAnalyzer {
    config: AnalyzerConfig,
}

impl Default for EquipmentAnalyzer {
    /// Uses the global config when initialized, else built-in defaults.
    fn default() -> Self {
        Self::new(config::get().clone())
    }
}

impl EquipmentAnalyzer {
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Override the high-temperature threshold. Rejects non-finite values.
    pub fn with_high_temperature_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.config.thresholds.high_temperature = threshold;
        self.config.validate()?;
        Ok(self)
    }

    /// Override the Z-score outlier threshold. Must be finite and positive.
    pub fn with_z_score_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.config.outliers.z_score_threshold = threshold;
        self.config.validate()?;
        Ok(self)
    }

    /// Parse, clean and analyze a CSV stream.
    pub fn analyze_reader<R: Read>(&self, reader: R) -> Result<AnalysisReport, AnalysisError> {
        let LoadedDataset { dataset, summary } = DataLoader::load(reader)?;
        self.analyze_dataset(&dataset, &summary)
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_reader(bytes)
    }

    /// Analyze an already cleaned dataset.
    pub fn analyze_dataset(
        &self,
        dataset: &EquipmentDataset,
        cleaning: &CleaningSummary,
    ) -> Result<AnalysisReport, AnalysisError> {
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }
        let started = Instant::now();
        let cfg = &self.config;

        // Metrics
        let summary_metrics = MetricsEngine::basic_metrics(dataset, cleaning);
        let type_metrics = MetricsEngine::type_metrics(dataset, &cfg.thresholds);
        let advanced_statistics = MetricsEngine::advanced_statistics(dataset, &cfg.correlation);
        debug!("Metrics computed");

        // Outliers
        let outliers = OutlierEngine::analyze(dataset, &cfg.outliers);

        // Efficiency runs before the narrative insights that quote its rankings
        let scored = EfficiencyEngine::score(dataset)
            .ok_or_else(|| AnalysisError::Internal("normalization produced no rows".to_string()))?;
        let efficiency = EfficiencyEngine::analyze(&scored);
        let performance_statistics = EfficiencyEngine::performance_statistics(&scored);

        // Insights
        let distributions = InsightsEngine::distributions(dataset);
        let correlations = InsightsEngine::correlations(dataset);
        let high_temperature = InsightsEngine::high_temperature(dataset, cfg.thresholds.high_temperature);
        let top_performers = InsightsEngine::top_performers(dataset, TOP_PERFORMER_COUNT);
        let comprehensive = InsightsEngine::comprehensive_insights(dataset, &efficiency, TOP_PERFORMER_COUNT);

        let dataset_info = DatasetInfo {
            cleaned_size: dataset.len(),
            original_columns: cleaning.original_columns.clone(),
            cleaning: cleaning.clone(),
        };
        let metadata = AnalysisMetadata {
            version: REPORT_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            parameters: Parameter::ALL.iter().map(|p| p.column().to_string()).collect(),
            equipment_types: dataset.types(),
            sections: SECTION_NAMES.iter().map(|s| (*s).to_string()).collect(),
            configuration: cfg.clone(),
        };

        let report = AnalysisReport {
            summary_metrics: lower(&summary_metrics)?,
            type_metrics: lower(&type_metrics)?,
            advanced_statistics: lower(&advanced_statistics)?,
            performance_statistics: lower(&performance_statistics)?,
            distributions: lower(&distributions)?,
            correlations: lower(&correlations)?,
            high_temperature_analysis: lower(&high_temperature)?,
            top_performers: lower(&top_performers)?,
            outliers: lower(&outliers)?,
            efficiency: lower(&efficiency)?,
            comprehensive_insights: lower(&comprehensive)?,
            dataset_info: lower(&dataset_info)?,
            analysis_metadata: lower(&metadata)?,
        };

        info!(
            equipment = dataset.len(),
            types = dataset.types().len(),
            outlier_equipment = outliers.pattern_analysis.summary.total_outlier_equipment,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(report)
    }
}

/// Lower a typed section into a JSON-safe report tree.
fn lower<T: Serialize>(section: &T) -> Result<serde_json::Value, AnalysisError> {
    value::lower(section)
        .map_err(|e| AnalysisError::Internal(format!("report serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
        P1,Pump,100,5,70\n\
        P1,Pump,100,5,70\n\
        C1,Compressor,50,9,60\n";

    #[test]
    fn test_duplicate_scenario() {
        let report = EquipmentAnalyzer::new(AnalyzerConfig::default())
            .analyze_bytes(CSV.as_bytes())
            .unwrap();
        assert_eq!(report.equipment_count(), 2);
        assert_eq!(
            report.pointer("summary_metrics.data_quality.duplicate_rows"),
            Some(&json!(1))
        );
        assert_eq!(
            report.pointer("distributions.equipment_types.Pump"),
            Some(&json!(1))
        );
        assert_eq!(
            report.pointer("comprehensive_insights.dataset_overview.type_distribution.Compressor"),
            Some(&json!(1))
        );
        for column in ["Flowrate", "Pressure", "Temperature"] {
            let path = format!("outliers.basic_analysis.{column}.outlier_count");
            assert_eq!(report.pointer(&path), Some(&json!(0)));
        }
        assert!(report.is_json_safe());
    }

    #[test]
    fn test_schema_error_before_statistics() {
        let csv = "Equipment Name,Type,Flowrate,Temperature\nP1,Pump,100,70\n";
        let err = EquipmentAnalyzer::new(AnalyzerConfig::default())
            .analyze_bytes(csv.as_bytes())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Schema { ref column } if column == "Pressure"));
    }

    #[test]
    fn test_overrides_reach_sections() {
        let report = EquipmentAnalyzer::new(AnalyzerConfig::default())
            .with_high_temperature_threshold(65.0)
            .unwrap()
            .with_z_score_threshold(1.5)
            .unwrap()
            .analyze_bytes(CSV.as_bytes())
            .unwrap();
        assert_eq!(
            report.pointer("high_temperature_analysis.threshold"),
            Some(&json!(65.0))
        );
        assert_eq!(
            report.pointer("high_temperature_analysis.count"),
            Some(&json!(1))
        );
        assert_eq!(
            report.pointer("outliers.zscore_analysis.Flowrate.threshold"),
            Some(&json!(1.5))
        );
    }

    #[test]
    fn test_non_finite_overrides_rejected() {
        let analyzer = EquipmentAnalyzer::new(AnalyzerConfig::default());
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = analyzer.clone().with_high_temperature_threshold(bad).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation(ref e) if e[0].contains("thresholds.high_temperature"))
            );
        }
        assert!(analyzer.clone().with_z_score_threshold(f64::NAN).is_err());
        assert!(analyzer.clone().with_z_score_threshold(0.0).is_err());
        assert!(analyzer.with_high_temperature_threshold(-20.0).is_ok());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let err = EquipmentAnalyzer::new(AnalyzerConfig::default())
            .analyze_dataset(&EquipmentDataset::default(), &CleaningSummary::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset));
    }
}
