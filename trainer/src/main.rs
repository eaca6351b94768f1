//! CLI entry point for the training pipeline.

use anyhow::{Context, Result, anyhow};
use automl_trainer::{
    CallbackSink, DatasetSource, FileSource, HttpSource, NoopSink, Pipeline, PipelineConfig,
    Profile, ResultRecord, ResultSink, TargetPolicy, TrainRequest,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

/// The record status was `Error`.
const EXIT_FAILED: u8 = 1;
/// The request or configuration was rejected before the pipeline ran.
const EXIT_REJECTED: u8 = 2;

/// CLI-compatible profile enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProfile {
    /// Random forest on at most 7500 rows
    Light,
    /// Boosted trees with feature engineering on at most 50000 rows
    Heavy,
}

impl From<CliProfile> for Profile {
    fn from(cli: CliProfile) -> Self {
        match cli {
            CliProfile::Light => Profile::Light,
            CliProfile::Heavy => Profile::Heavy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Train a tree-ensemble model on a CSV dataset",
    long_about = "Downloads a CSV, detects the target (last column by default), prepares \
                  the features, trains a random forest or boosted trees and reports \
                  held-out metrics.\n\n\
                  EXIT CODES:\n  \
                  0  training complete\n  \
                  1  training failed (an Error record was produced)\n  \
                  2  request or configuration rejected\n\n\
                  EXAMPLES:\n  \
                  automl-trainer --csv-url https://example.com/data.csv --email me@example.com\n\n  \
                  automl-trainer --request request.json --profile heavy --json"
)]
struct Args {
    /// URL (or local path) of the CSV dataset
    #[arg(long)]
    csv_url: Option<String>,

    /// Identity of the requester, echoed in the result
    #[arg(long)]
    email: Option<String>,

    /// URL that receives the result record as a JSON POST
    #[arg(long)]
    callback_url: Option<String>,

    /// Configuration preset
    #[arg(long, value_enum, default_value = "light")]
    profile: CliProfile,

    /// JSON request body with csvUrl, email and callbackUrl
    ///
    /// Flags given on the command line override fields of the file.
    #[arg(long)]
    request: Option<PathBuf>,

    /// JSON file overriding fields of the selected preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target column (defaults to the last column)
    #[arg(short, long)]
    target: Option<String>,

    /// Output only the JSON result record
    ///
    /// Disables all logging so stdout carries nothing but JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    // Load .env first so RUST_LOG from it applies
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let accepted = build_request(&args).and_then(|request| Ok((request, build_config(&args)?)));
    let (request, config) = match accepted {
        Ok(parts) => parts,
        Err(e) => {
            error!("Rejected: {:#}", e);
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_REJECTED);
        }
    };

    let record = run(&request, config);

    if args.json {
        match serde_json::to_string_pretty(&record) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize result: {e}");
                return ExitCode::from(EXIT_FAILED);
            }
        }
    } else {
        print_human_readable_summary(&record, &request);
    }

    if record.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}

fn run(request: &TrainRequest, config: PipelineConfig) -> ResultRecord {
    let source = dataset_source(&request.csv_url, config.download_timeout_secs);
    let sink: Box<dyn ResultSink> = match &request.callback_url {
        Some(url) => {
            info!("Result will be posted to {}", url);
            Box::new(CallbackSink::new(url).with_timeout_secs(config.callback_timeout_secs))
        }
        None => Box::new(NoopSink),
    };

    Pipeline::new(config).run(source.as_ref(), &request.email, sink.as_ref())
}

/// HTTP(S) URLs are fetched, anything else is read from disk.
fn dataset_source(location: &str, timeout_secs: u64) -> Box<dyn DatasetSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location).with_timeout_secs(timeout_secs))
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        Box::new(FileSource::new(path))
    }
}

/// Merge the request file with the command-line flags.
fn build_request(args: &Args) -> Result<TrainRequest> {
    let mut body = match &args.request {
        Some(path) => read_json(path)?,
        None => Value::Object(Map::new()),
    };
    let fields = body
        .as_object_mut()
        .ok_or_else(|| anyhow!("request file must contain a JSON object"))?;

    // Canonical keys are looked up first, so flags win over file aliases
    for (key, flag) in [
        ("csvUrl", &args.csv_url),
        ("email", &args.email),
        ("callbackUrl", &args.callback_url),
    ] {
        if let Some(value) = flag {
            fields.insert(key.to_string(), Value::String(value.clone()));
        }
    }

    let request = TrainRequest::from_value(&body)?;
    debug!(csv_url = %request.csv_url, email = %request.email, "Request accepted");
    Ok(request)
}

/// The selected preset, overlaid with the config file and `--target`.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let preset = Profile::from(args.profile).config();

    let mut config: PipelineConfig = match &args.config {
        Some(path) => {
            let mut merged = serde_json::to_value(&preset)?;
            let overrides = read_json(path)?;
            let overrides = overrides
                .as_object()
                .ok_or_else(|| anyhow!("config file must contain a JSON object"))?;
            if let Some(fields) = merged.as_object_mut() {
                for (key, value) in overrides {
                    fields.insert(key.clone(), value.clone());
                }
            }
            serde_json::from_value(merged)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => preset,
    };

    if let Some(target) = &args.target {
        config.target_policy = TargetPolicy::Named(target.clone());
    }

    config.validate()?;
    info!(
        profile = %Profile::from(args.profile),
        row_cap = config.row_cap,
        model = %config.model_kind,
        "Configuration loaded"
    );
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Print the result for a person at a terminal.
///
/// Uses `println!` so the summary shows regardless of log level.
fn print_human_readable_summary(record: &ResultRecord, request: &TrainRequest) {
    println!();
    println!("{}", "=".repeat(80));
    if record.is_complete() {
        println!("TRAINING COMPLETE");
    } else {
        println!("TRAINING FAILED");
    }
    println!("{}", "=".repeat(80));
    println!();

    println!("Dataset:   {}", request.csv_url);
    println!("Requester: {}", record.email);
    if let Some(problem_type) = record.problem_type {
        println!("Problem Type: {}", problem_type);
    }
    println!();

    println!("{}", record.message);
    if let Some(details) = &record.details {
        println!("{}", details);
    }

    if let Some(summary) = &record.summary {
        println!();
        println!("SUMMARY");
        println!("{}", "-".repeat(40));
        println!("  Model:    {}", summary.model);
        println!("  Target:   {}", summary.target);
        println!(
            "  Rows:     {} loaded, {} used ({} train / {} test)",
            summary.rows_loaded, summary.rows_used, summary.train_rows, summary.test_rows
        );
        println!("  Features: {}", summary.features);
        if !summary.dropped_columns.is_empty() {
            println!("  Dropped:  {}", summary.dropped_columns.join(", "));
        }
        if !summary.classes.is_empty() {
            println!("  Classes:  {}", summary.classes.join(", "));
        }
        if !summary.removed_classes.is_empty() {
            println!("  Removed rare classes: {}", summary.removed_classes.join(", "));
        }
        match summary.best_iteration {
            Some(best) => println!("  Trees:    {} (best round {})", summary.n_trees, best),
            None => println!("  Trees:    {}", summary.n_trees),
        }
        println!("  Training time: {:.2}s", summary.training_time_seconds);
    }

    if let Some(metrics) = record.metrics.as_ref()
        && let Some(cv) = metrics.cv_score
    {
        println!("  Cross-validation score: {:.4}", cv);
    }

    println!();
    println!("Completed at {}", record.completed_at.to_rfc3339());
    println!("{}", "=".repeat(80));
}
