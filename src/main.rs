//! CLI entry point for the nut tasting analysis.
//!
//! Loads a survey workbook or CSV export and writes per-category response
//! count charts, score predictor charts and summary CSVs.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use nut_rater::analyzers::analyzer::{Outputs, run};
use nut_rater::config::Config;
use nut_rater::dataset::Dataset;
use nut_rater::loader::{load_csv, load_workbook};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "nut_rater")]
#[command(about = "Descriptive statistics and charts for nut tasting surveys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bar charts of the number of responses per item
    Counts(RunArgs),
    /// Scatter charts of overall score against each property
    Predictors(RunArgs),
    /// CSV summaries of per-item means and standard errors
    Summary(RunArgs),
    /// Count charts, predictor charts and summaries
    All(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Workbook with code, item and evaluation sheets
    #[arg(short, long, value_name = "XLSX")]
    workbook: Option<PathBuf>,

    /// Flat CSV export of ratings
    #[arg(long, value_name = "CSV", conflicts_with = "workbook", required_unless_present = "workbook")]
    csv: Option<PathBuf>,

    /// Directory to write charts and summaries to
    #[arg(short, long, default_value = "figs")]
    output_dir: PathBuf,

    /// JSON file overriding sheet/column names and chart settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category name for CSV input (overrides the config)
    #[arg(long)]
    category: Option<String>,

    /// Keep only the first N testers
    #[arg(long)]
    max_testers: Option<usize>,

    /// Keep only the first N rated items
    #[arg(long)]
    max_items: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/nut_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nut_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let (args, outputs) = match cli.command {
        Commands::Counts(args) => (args, Outputs {
            counts: true,
            predictors: false,
            summary: false,
        }),
        Commands::Predictors(args) => (args, Outputs {
            counts: false,
            predictors: true,
            summary: false,
        }),
        Commands::Summary(args) => (args, Outputs {
            counts: false,
            predictors: false,
            summary: true,
        }),
        Commands::All(args) => (args, Outputs::all()),
    };

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(category) = args.category.clone() {
        config.schema.csv_category = category;
    }

    let dataset = load_dataset(&args, &config)?;
    let dataset = if args.max_testers.is_some() || args.max_items.is_some() {
        let restricted = dataset.restrict(args.max_testers, args.max_items);
        info!(
            max_testers = args.max_testers,
            max_items = args.max_items,
            ratings = restricted.rating_count(),
            "Dataset restricted"
        );
        restricted
    } else {
        dataset
    };

    let written = run(&dataset, &args.output_dir, &config.charts, outputs)?;
    for path in &written {
        info!(path = %path.display(), "Written");
    }

    Ok(())
}

/// Loads ratings from whichever source was given on the command line.
#[tracing::instrument(skip_all)]
fn load_dataset(args: &RunArgs, config: &Config) -> Result<Dataset> {
    match (&args.workbook, &args.csv) {
        (Some(path), _) => load_workbook(path, &config.schema),
        (None, Some(path)) => load_csv(path, &config.schema),
        (None, None) => Err(anyhow::anyhow!("either --workbook or --csv is required")),
    }
}
