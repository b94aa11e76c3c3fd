//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with fixed (p, d, q) orders
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - Conditional-sum-of-squares estimation shared by both

mod css;
mod diff;
mod model;
mod sarima;

pub use diff::{difference, differencing_polynomial, integrate, seasonal_difference};
pub use model::{ARIMASpec, ARIMA};
pub use sarima::{SARIMASpec, SARIMA};
