//! # accident-forecast
//!
//! Monthly accident-count forecasting.
//!
//! The pipeline normalizes a raw accident table into per-category monthly
//! series, fits one fixed-order seasonal ARIMA model per category on the
//! pre-2020 months, scores it against 2020, persists the fitted registry and
//! serves validated, non-negative point forecasts for any later month.
//!
//! ```no_run
//! use accident_forecast::prelude::*;
//!
//! let data = load_and_normalize("data/monatszahlen.csv")?;
//! let outcome = ModelTrainer::new(TrainingConfig::default()).train_all(&data.series);
//! ModelStore::default().save(&outcome.registry)?;
//!
//! let service = ForecastService::startup(&ModelStore::default());
//! let forecast = service.predict("Alkoholunfälle", 2021, 1)?;
//! println!("{}", forecast.predicted_value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod series;
pub mod service;
pub mod store;
pub mod training;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::{ModelFamily, TrainingConfig};
    pub use crate::core::{CategorySeries, Forecast, MonthlySeries, ObservationPoint};
    pub use crate::data::{load_and_normalize, normalize, NormalizedData, RawRecord};
    pub use crate::error::{
        DataError, ForecastError, PersistenceError, Result, ServiceError, TrainingError,
    };
    pub use crate::models::{FittedModel, Forecaster, ModelRegistry};
    pub use crate::service::{ForecastService, PointForecast, PredictionRequest, SharedRegistry};
    pub use crate::store::ModelStore;
    pub use crate::training::{ModelTrainer, TrainingOutcome};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
