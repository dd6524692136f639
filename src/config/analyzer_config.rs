//! Analyzer Configuration - analysis thresholds as operator-tunable TOML values
//!
//! Each struct implements `Default` with the values from [`super::defaults`],
//! so behavior is unchanged when no config file is present.

use super::defaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ANALYZER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "analyzer_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the analyzer.
///
/// Load with [`AnalyzerConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Domain thresholds for type metrics and the high-temperature section
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Outlier detector tuning
    #[serde(default)]
    pub outliers: OutlierConfig,

    /// Correlation classification
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Upload boundary limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Report history store
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AnalyzerConfig {
    /// Resolve and load the config file for this process.
    ///
    /// An explicit path wins over `$ANALYZER_CONFIG`, which wins over
    /// `./analyzer_config.toml`. A named file that fails to load is an error;
    /// only the absence of every candidate falls back to defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match Self::locate(explicit, env_path) {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                info!(path = %path.display(), "Loaded analyzer config");
                Ok(config)
            }
            None => {
                debug!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Pick the config file to read, if any.
    pub fn locate(explicit: Option<&Path>, env_path: Option<PathBuf>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or(env_path)
            .or_else(|| {
                let local = PathBuf::from(LOCAL_CONFIG_FILE);
                local.is_file().then_some(local)
            })
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { origin: path.display().to_string(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|source| ConfigError::Parse { origin: "<inline>".to_string(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), "Analyzer config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Every float must be finite
    /// - Multipliers and z-score threshold must be positive
    /// - Correlation thresholds lie in (0, 1] and very_strong >= strong
    /// - Upload size cap and retention count must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.operational_temperature", t.operational_temperature),
            ("thresholds.operational_pressure", t.operational_pressure),
            ("thresholds.operational_flowrate", t.operational_flowrate),
            ("thresholds.high_temperature", t.high_temperature),
        ] {
            Self::check_finite(name, value, &mut errors);
        }

        let o = &self.outliers;
        Self::check_positive("outliers.iqr_multiplier", o.iqr_multiplier, &mut errors);
        Self::check_positive("outliers.z_score_threshold", o.z_score_threshold, &mut errors);

        let c = &self.correlation;
        for (name, value) in [
            ("correlation.strong_threshold", c.strong_threshold),
            ("correlation.very_strong_threshold", c.very_strong_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                errors.push(format!("{name} must be in (0, 1], got {value}"));
            }
        }
        if c.very_strong_threshold < c.strong_threshold {
            errors.push(format!(
                "correlation.very_strong_threshold ({:.2}) must be >= strong_threshold ({:.2})",
                c.very_strong_threshold, c.strong_threshold
            ));
        }

        if self.upload.max_file_bytes == 0 {
            errors.push("upload.max_file_bytes must be > 0".to_string());
        }
        if self.upload.allowed_extension.trim().is_empty() {
            errors.push("upload.allowed_extension must not be empty".to_string());
        }
        if self.storage.retain_per_user == 0 {
            errors.push("storage.retain_per_user must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_finite(name: &str, value: f64, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name} must be finite, got {value}"));
        }
    }

    fn check_positive(name: &str, value: f64, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness first
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be a finite value > 0, got {value}"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML ({origin}): {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("analyzer config is already initialized")]
    AlreadyInitialized,
}

// ============================================================================
// Sections
// ============================================================================

/// Fixed domain thresholds. These are operating limits, not data-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Temperature counted as high in per-type operational flags
    pub operational_temperature: f64,
    /// Pressure counted as high in per-type operational flags
    pub operational_pressure: f64,
    /// Flowrate counted as high in per-type operational flags
    pub operational_flowrate: f64,
    /// Threshold for the high-temperature analysis section
    pub high_temperature: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            operational_temperature: defaults::OPERATIONAL_TEMPERATURE,
            operational_pressure: defaults::OPERATIONAL_PRESSURE,
            operational_flowrate: defaults::OPERATIONAL_FLOWRATE,
            high_temperature: defaults::HIGH_TEMPERATURE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub iqr_multiplier: f64,
    pub z_score_threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: defaults::IQR_MULTIPLIER,
            z_score_threshold: defaults::Z_SCORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// |r| at or above which a pair is extracted as a strong correlation
    pub strong_threshold: f64,
    /// |r| at or above which an extracted pair is labelled "Strong"
    pub very_strong_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            strong_threshold: defaults::STRONG_CORRELATION,
            very_strong_threshold: defaults::VERY_STRONG_CORRELATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_allowed_extension")]
    pub allowed_extension: String,
}

fn default_max_file_bytes() -> u64 {
    defaults::MAX_UPLOAD_BYTES
}
fn default_allowed_extension() -> String {
    defaults::UPLOAD_EXTENSION.to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            allowed_extension: default_allowed_extension(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    #[serde(default = "default_retain_per_user")]
    pub retain_per_user: usize,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::REPORT_DB_PATH)
}
fn default_retain_per_user() -> usize {
    defaults::REPORTS_RETAINED_PER_USER
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            retain_per_user: default_retain_per_user(),
        }
    }
}
