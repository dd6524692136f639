//! Analyzer Configuration Module
//!
//! Provides the analysis thresholds and boundary limits loaded from TOML,
//! replacing hardcoded constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `--config <PATH>` on the command line
//! 2. `ANALYZER_CONFIG` environment variable (path to TOML file)
//! 3. `analyzer_config.toml` in the current working directory
//! 4. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(AnalyzerConfig::resolve(cli_path)?)?;
//!
//! // Anywhere in the codebase:
//! let threshold = config::get().thresholds.high_temperature;
//! ```

mod analyzer_config;
pub mod defaults;

pub use analyzer_config::*;

use std::sync::OnceLock;

/// Global analyzer configuration, initialized once at startup.
static ANALYZER_CONFIG: OnceLock<AnalyzerConfig> = OnceLock::new();

/// Built-in defaults served by [`get`] until [`init`] runs.
static BUILT_IN: OnceLock<AnalyzerConfig> = OnceLock::new();

/// Initialize the global analyzer configuration. Fails if already set.
pub fn init(config: AnalyzerConfig) -> Result<(), ConfigError> {
    ANALYZER_CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Get the global analyzer configuration, or the built-in defaults when
/// `init()` has not been called. Reading never initializes the global.
pub fn get() -> &'static AnalyzerConfig {
    ANALYZER_CONFIG
        .get()
        .unwrap_or_else(|| BUILT_IN.get_or_init(AnalyzerConfig::default))
}

/// Check whether a config has been installed with [`init`].
pub fn is_initialized() -> bool {
    ANALYZER_CONFIG.get().is_some()
}
