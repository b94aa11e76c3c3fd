//! Core data structures for monthly time series forecasting.

mod forecast;
pub mod month;
mod series;

pub use forecast::Forecast;
pub use series::{CategorySeries, MonthlySeries, ObservationPoint};
