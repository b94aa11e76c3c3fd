//! Forecasting models.

mod registry;
mod traits;

pub mod arima;

pub use registry::{FittedModel, ModelFamily, ModelRegistry};
pub use traits::Forecaster;
