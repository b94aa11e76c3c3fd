//! Numerical utilities shared by the models and the trainer.

pub mod metrics;
pub mod optimization;

pub use metrics::{calculate_metrics, rmse, AccuracyMetrics};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
