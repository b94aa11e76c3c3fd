//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};

/// Accuracy metrics for evaluating forecast performance.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// Both slices must be non-empty, of equal length, and finite.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "expected {} predictions, got {}",
            actual.len(),
            predicted.len()
        )));
    }

    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(
            "non-finite value in evaluation input".to_string(),
        ));
    }

    let n = actual.len() as f64;
    let errors = || actual.iter().zip(predicted).map(|(a, p)| a - p);

    let mae = errors().map(f64::abs).sum::<f64>() / n;
    let mse = errors().map(|e| e * e).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| ((a - p) / a).abs())
            .sum();
        Some(100.0 * sum / n)
    };

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse,
        mape,
    })
}

/// Root mean squared error. NaN for empty or mismatched input.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    calculate_metrics(actual, predicted)
        .map(|m| m.rmse)
        .unwrap_or(f64::NAN)
}
