//! equipment-analyzer - chemical process equipment analytics
//!
//! Analyzes an equipment CSV (`Equipment Name, Type, Flowrate, Pressure,
//! Temperature`) and prints the JSON report.
//!
//! # Usage
//!
//! ```bash
//! # One-shot analysis to stdout
//! equipment-analyzer analyze plant.csv
//!
//! # Analyze and keep in the local report history
//! equipment-analyzer analyze plant.csv --user alice --store
//!
//! # Browse history
//! equipment-analyzer history --user alice
//! equipment-analyzer show <ID>
//! equipment-analyzer delete <ID>
//! ```
//!
//! # Environment Variables
//!
//! - `ANALYZER_CONFIG`: Path to TOML config (default: ./analyzer_config.toml)
//! - `ANALYZER_USER`: Default user for `analyze` and `history`
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use equipment_analyzer::config::{self, AnalyzerConfig};
use equipment_analyzer::storage::{self, InMemoryReportStore, ReportStore};
use equipment_analyzer::upload::{UploadRequest, UploadService};
use equipment_analyzer::{AnalysisReport, EquipmentAnalyzer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "equipment-analyzer")]
#[command(about = "Statistics, outlier detection and efficiency scoring for process equipment")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides ANALYZER_CONFIG and ./analyzer_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Analyze a CSV file and print the report
    Analyze {
        /// Path to the equipment CSV
        file: PathBuf,

        /// Owner of the stored report
        #[arg(long, env = "ANALYZER_USER", default_value = "local")]
        user: String,

        /// Keep the report in the local history database
        #[arg(long)]
        store: bool,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Override [thresholds].high_temperature
        #[arg(long, value_name = "DEG")]
        high_temperature_threshold: Option<f64>,

        /// Override [outliers].z_score_threshold
        #[arg(long, value_name = "Z")]
        z_threshold: Option<f64>,
    },

    /// List a user's stored reports, newest first
    History {
        #[arg(long, env = "ANALYZER_USER", default_value = "local")]
        user: String,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Print a stored report
    Show {
        id: Uuid,

        #[arg(long)]
        compact: bool,
    },

    /// Delete a stored report
    Delete { id: Uuid },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Helpers
// ============================================================================

fn render(report: &AnalysisReport, compact: bool) -> Result<String> {
    let json = if compact {
        report.to_json()
    } else {
        report.to_json_pretty()
    };
    json.context("Failed to serialize report")
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn open_history() -> Result<storage::SledReportStore> {
    let cfg = config::get();
    storage::open_configured(&cfg.storage)
        .with_context(|| format!("Failed to open report storage at {}", cfg.storage.path.display()))
}

// ============================================================================
// Commands
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    file: &Path,
    user: &str,
    store: bool,
    output: Option<&Path>,
    compact: bool,
    high_temperature_threshold: Option<f64>,
    z_threshold: Option<f64>,
) -> Result<()> {
    let mut analyzer = EquipmentAnalyzer::default();
    if let Some(t) = high_temperature_threshold {
        analyzer = analyzer
            .with_high_temperature_threshold(t)
            .context("Invalid --high-temperature-threshold")?;
    }
    if let Some(z) = z_threshold {
        analyzer = analyzer
            .with_z_score_threshold(z)
            .context("Invalid --z-threshold")?;
    }

    let content = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let backend: Arc<dyn ReportStore> = if store {
        Arc::new(open_history()?)
    } else {
        Arc::new(InMemoryReportStore::new(1))
    };
    let service = UploadService::new(analyzer, backend);

    let receipt = match service.handle(&UploadRequest::new(user, filename, content)) {
        Ok(receipt) => receipt,
        Err(e) => bail!("{}", e.user_message()),
    };

    if store {
        info!(id = %receipt.id(), user, "Report stored");
    }
    emit(&render(receipt.report(), compact)?, output)
}

fn run_history(user: &str, limit: usize) -> Result<()> {
    let store = open_history()?;
    let reports = store.list_for_user(user, limit)?;
    if reports.is_empty() {
        println!("No reports for {user}");
        return Ok(());
    }
    for stored in reports {
        println!(
            "{}  {}  {:>8} bytes  {:>5} equipment  {}",
            stored.id,
            stored.metadata.upload_timestamp.format("%Y-%m-%d %H:%M:%S"),
            stored.metadata.file_size,
            stored.metadata.equipment_count,
            stored.metadata.filename,
        );
    }
    Ok(())
}

fn run_show(id: Uuid, compact: bool) -> Result<()> {
    let store = open_history()?;
    let Some(stored) = store.get(id)? else {
        bail!("No report with id {id}");
    };
    emit(&render(&stored.report, compact)?, None)
}

fn run_delete(id: Uuid) -> Result<()> {
    open_history()?
        .delete(id)
        .with_context(|| format!("Failed to delete report {id}"))?;
    info!(%id, "Report deleted");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let loaded = AnalyzerConfig::resolve(args.config.as_deref()).context("Failed to load config")?;
    config::init(loaded)?;

    match args.command {
        SubCommand::Analyze {
            file,
            user,
            store,
            output,
            compact,
            high_temperature_threshold,
            z_threshold,
        } => run_analyze(
            &file,
            &user,
            store,
            output.as_deref(),
            compact,
            high_temperature_threshold,
            z_threshold,
        ),
        SubCommand::History { user, limit } => run_history(&user, limit),
        SubCommand::Show { id, compact } => run_show(id, compact),
        SubCommand::Delete { id } => run_delete(id),
        SubCommand::Config => {
            print!("{}", config::get().to_toml()?);
            Ok(())
        }
    }
}
