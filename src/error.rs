//! Error types for the accident-forecast pipeline.
//!
//! Each boundary of the pipeline owns one error type. Model-level numerical
//! failures are [`ForecastError`]; they are wrapped by [`TrainingError`] during
//! training and by [`ServiceError::PredictionFailure`] when serving.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by the forecasting models and the monthly calendar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the requested model order.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// The requested date lies before the first month the model was trained on.
    #[error("date {date} is before the training start {start}")]
    DateOutOfRange { date: NaiveDate, start: NaiveDate },

    /// Observations could not be placed on a strict monthly grid.
    #[error("could not align series to a monthly grid: {0}")]
    FrequencyAlignment(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Errors raised while reading and normalizing the source table.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to open source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read source: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid source schema: {0}")]
    Schema(String),

    #[error("no usable rows after filtering ({rows_read} rows read)")]
    NoUsableRows { rows_read: usize },
}

/// Per-category training failure. The trainer skips the category and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("no training points on or before the split boundary")]
    EmptyTrain,

    #[error("no test points on or after the split boundary")]
    EmptyTest,

    #[error(transparent)]
    Model(#[from] ForecastError),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Errors raised while persisting or restoring the model registry.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("artifact i/o failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },
}

/// Errors surfaced by the forecast service to its caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Malformed request input (client fault).
    #[error("{0}")]
    Validation(String),

    /// The request was well formed but the category has no fitted model.
    #[error("category '{0}' not found")]
    UnknownCategory(String),

    /// The model failed to produce a usable value (server fault).
    #[error("prediction failed for {category} at {date}: {cause}")]
    PredictionFailure {
        category: String,
        date: NaiveDate,
        cause: String,
    },
}

impl ServiceError {
    /// HTTP-style status code for the serving layer.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::UnknownCategory(_) => 404,
            ServiceError::PredictionFailure { .. } => 500,
        }
    }

    /// Whether the caller, rather than the service, is at fault.
    pub fn is_client_fault(&self) -> bool {
        self.status_code() < 500
    }
}
