use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use serde::Serialize;

use wifi_archive::data::loader::{load_file, ParseOptions};
use wifi_archive::data::upload::{batches, UploadDescriptor};
use wifi_archive::{build_report, AnalysisConfig, EngineError, SchemaVersion, TelemetryDataset};

#[derive(Parser)]
#[command(name = "wifi-archive", version, about = "Summarise WiFi measurement telemetry")]
struct Cli {
    /// JSON config file (overrides WIFI_ARCHIVE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Statistics, quality, histograms, breakdowns and chart series for a file
    Report {
        file: PathBuf,
        /// Force a layout (v1, v3, untyped) instead of detecting it
        #[arg(long)]
        schema: Option<SchemaVersion>,
    },
    /// Upload descriptor and write-batch plan for a file
    Describe {
        file: PathBuf,
        #[arg(long)]
        uploader: String,
        #[arg(long)]
        schema: Option<SchemaVersion>,
    },
}

#[derive(Serialize)]
struct UploadPlan {
    descriptor: UploadDescriptor,
    batch_size: usize,
    batches: Vec<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?
            .with_overrides(|key| std::env::var(key).ok()),
        None => AnalysisConfig::from_env().context("loading configuration")?,
    };

    match &cli.command {
        Command::Report { file, schema } => {
            let dataset = load(file, &config, *schema)?;
            let report = build_report(dataset.schema, &dataset.records, &config)?;
            print_json(&report, cli.pretty)
        }
        Command::Describe {
            file,
            uploader,
            schema,
        } => {
            let dataset = load(file, &config, *schema)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let descriptor = UploadDescriptor::describe(
                file_name,
                uploader.as_str(),
                &dataset.records,
                &config.fallback_location,
            );
            let plan = UploadPlan {
                descriptor,
                batch_size: config.batch_size,
                batches: batches(&dataset.records, config.batch_size)?
                    .map(<[_]>::len)
                    .collect(),
            };
            print_json(&plan, cli.pretty)
        }
    }
}

/// Load a file, falling back to the all-text layout when its header matches
/// no known schema and none was forced.
fn load(
    path: &Path,
    config: &AnalysisConfig,
    schema: Option<SchemaVersion>,
) -> Result<TelemetryDataset> {
    let options = config.parse_options(schema)?;
    match load_file(path, &options) {
        Err(err) if schema.is_none() && is_unknown_schema(&err) => {
            warn!("{err:#}; reading every column as text");
            let untyped = ParseOptions {
                schema: Some(SchemaVersion::Untyped),
                ..options
            };
            load_file(path, &untyped)
        }
        other => other,
    }
}

fn is_unknown_schema(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<EngineError>(),
            Some(EngineError::UnknownSchema { .. })
        )
    })
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
