//! # accident-forecast
//!
//! Command-line entry point: train per-category models from the accident
//! table, inspect the data, and query point forecasts from a saved registry.

use accident_forecast::config::{ModelFamily, TrainingConfig};
use accident_forecast::data::load_and_normalize;
use accident_forecast::service::{ForecastService, DEFAULT_CATEGORY};
use accident_forecast::store::ModelStore;
use accident_forecast::training::{train_and_save, TrainAndSaveError};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DATA_PATH: &str = "data/monatszahlen_verkehrsunfaelle.csv";

#[derive(Parser)]
#[command(name = "accident-forecast", version, about = "Monthly accident-count forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit one model per category and save the registry.
    Train {
        /// Source table (CSV with header).
        #[arg(long, env = "ACCIDENT_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,
        /// Artifact path; defaults to the family's standard location.
        #[arg(long, env = "ACCIDENT_MODEL_PATH")]
        model_path: Option<PathBuf>,
        #[arg(long, env = "ACCIDENT_MODEL_FAMILY", default_value = "sarima")]
        family: ModelFamily,
        /// Restrict coefficients to the stationary region.
        #[arg(long)]
        enforce_stationarity: bool,
        /// Fit categories one at a time.
        #[arg(long)]
        sequential: bool,
    },
    /// Print a point forecast for one month.
    Predict {
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
        #[arg(long)]
        year: i32,
        #[arg(long, allow_negative_numbers = true)]
        month: i64,
        #[arg(long, env = "ACCIDENT_MODEL_PATH")]
        model_path: Option<PathBuf>,
    },
    /// List categories available in the saved registry.
    Categories {
        #[arg(long, env = "ACCIDENT_MODEL_PATH")]
        model_path: Option<PathBuf>,
    },
    /// Summarize the normalized source data.
    Summary {
        #[arg(long, env = "ACCIDENT_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,
    },
}

fn store_at(path: Option<PathBuf>) -> ModelStore {
    path.map(ModelStore::new).unwrap_or_default()
}

fn train(
    data: PathBuf,
    model_path: Option<PathBuf>,
    family: ModelFamily,
    enforce_stationarity: bool,
    sequential: bool,
) -> anyhow::Result<()> {
    let normalized = load_and_normalize(&data)
        .with_context(|| format!("failed to load source data from {}", data.display()))?;

    let config = match family {
        ModelFamily::Sarima => TrainingConfig::default(),
        ModelFamily::Arima => TrainingConfig::arima(),
    }
    .with_enforce_stationarity(enforce_stationarity)
    .with_parallel(!sequential);

    let store = model_path
        .map(ModelStore::new)
        .unwrap_or_else(|| ModelStore::for_family(family));

    let outcome = match train_and_save(config, &store, &normalized.series) {
        Ok(outcome) => outcome,
        Err(TrainAndSaveError::NothingTrained { outcome }) => {
            for skipped in &outcome.skipped {
                eprintln!("skipped {}: {}", skipped.category, skipped.error);
            }
            bail!("no models were trained successfully; nothing saved");
        }
        Err(err) => return Err(err.into()),
    };

    for (category, metrics) in &outcome.metrics {
        println!("{category:<30} rmse {:>10.3}", metrics.rmse);
    }
    for skipped in &outcome.skipped {
        println!("{:<30} skipped: {}", skipped.category, skipped.error);
    }
    if let Some(mean) = outcome.mean_rmse() {
        println!("mean rmse {mean:.3} over {} categories", outcome.trained());
    }
    println!("saved {} models to {}", outcome.trained(), store.path().display());
    Ok(())
}

fn predict(
    category: String,
    year: i32,
    month: i64,
    model_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let service = ForecastService::startup(&store_at(model_path));
    let forecast = service.predict(&category, year, month)?;
    println!("{}", serde_json::to_string_pretty(&forecast)?);
    Ok(())
}

fn categories(model_path: Option<PathBuf>) -> anyhow::Result<()> {
    let service = ForecastService::startup(&store_at(model_path));
    for category in service.categories() {
        println!("{category}");
    }
    Ok(())
}

fn summary(data: PathBuf) -> anyhow::Result<()> {
    let normalized = load_and_normalize(&data)
        .with_context(|| format!("failed to load source data from {}", data.display()))?;

    let report = &normalized.report;
    println!(
        "{} rows read, {} kept, {} dropped",
        report.rows_read,
        report.rows_kept,
        report.drops.len()
    );
    for (reason, count) in report.drop_counts() {
        println!("  {reason:<28} {count}");
    }
    for summary in normalized.summaries() {
        println!(
            "{:<30} {} .. {} ({} months)",
            summary.category,
            summary.first.format("%Y-%m"),
            summary.last.format("%Y-%m"),
            summary.points
        );
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Train {
            data,
            model_path,
            family,
            enforce_stationarity,
            sequential,
        } => train(data, model_path, family, enforce_stationarity, sequential),
        Command::Predict {
            category,
            year,
            month,
            model_path,
        } => predict(category, year, month, model_path),
        Command::Categories { model_path } => categories(model_path),
        Command::Summary { data } => summary(data),
    }
}

fn main() -> ExitCode {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accident_forecast=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
