//! Conditional sum of squares (CSS) estimation shared by ARIMA and SARIMA.
//!
//! Both families reduce to an ARMA recursion on the differenced series with
//! expanded lag polynomials. Observations before `start` are conditioned on:
//! their residuals are zero, and lags that reach before the first observation
//! contribute nothing (their deviation from the mean is taken as zero).

use crate::error::{ForecastError, Result};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// Coefficient bound used when stationarity and invertibility are enforced.
pub const STATIONARY_BOUND: f64 = 0.99;

/// One-step-ahead residuals of an ARMA model with expanded coefficients.
///
/// `ar[k]` and `ma[k]` are the coefficients on lag `k + 1`.
pub fn conditional_residuals(
    series: &[f64],
    ar: &[f64],
    ma: &[f64],
    mean: f64,
    start: usize,
) -> Vec<f64> {
    let n = series.len();
    let mut residuals = vec![0.0; n];

    for t in start.min(n)..n {
        let mut pred = mean;
        for (k, a) in ar.iter().enumerate().take(t) {
            pred += a * (series[t - 1 - k] - mean);
        }
        for (k, m) in ma.iter().enumerate().take(t) {
            pred += m * residuals[t - 1 - k];
        }
        residuals[t] = series[t] - pred;
    }

    residuals
}

/// Sum of squared residuals from `start` on. Non-finite sums map to `f64::MAX`.
pub fn conditional_sum_of_squares(
    series: &[f64],
    ar: &[f64],
    ma: &[f64],
    mean: f64,
    start: usize,
) -> f64 {
    let css: f64 = conditional_residuals(series, ar, ma, mean, start)
        .iter()
        .skip(start)
        .map(|e| e * e)
        .sum();
    if css.is_finite() {
        css
    } else {
        f64::MAX
    }
}

/// Minimize `objective` over a parameter vector and reject diverged fits.
///
/// An empty `initial` skips optimization entirely.
pub fn minimize(
    objective: impl Fn(&[f64]) -> f64,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
) -> Result<Vec<f64>> {
    if initial.is_empty() {
        return Ok(Vec::new());
    }

    let config = NelderMeadConfig {
        max_iter: 2000,
        tolerance: 1e-8,
        ..Default::default()
    };
    let result = nelder_mead(objective, initial, bounds, config);

    if !result.optimal_value.is_finite() || result.optimal_value == f64::MAX {
        return Err(ForecastError::ComputationError(
            "conditional sum of squares diverged".to_string(),
        ));
    }
    if result.optimal_point.iter().any(|p| !p.is_finite()) {
        return Err(ForecastError::ComputationError(
            "non-finite coefficient estimate".to_string(),
        ));
    }
    if !result.converged {
        tracing::debug!(
            iterations = result.iterations,
            css = result.optimal_value,
            "optimizer stopped before convergence"
        );
    }

    Ok(result.optimal_point)
}

/// Residual variance and information criteria from CSS residuals.
pub struct FitStatistics {
    pub residual_variance: f64,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
}

/// Summarize residuals from `start` on for a model with `num_params` parameters.
pub fn fit_statistics(residuals: &[f64], start: usize, num_params: usize) -> Result<FitStatistics> {
    let valid = residuals.get(start..).unwrap_or(&[]);
    if valid.is_empty() {
        return Err(ForecastError::InsufficientData {
            needed: start + 1,
            got: residuals.len(),
        });
    }

    let n_eff = valid.len() as f64;
    let variance = valid.iter().map(|r| r * r).sum::<f64>() / n_eff;
    if !variance.is_finite() {
        return Err(ForecastError::ComputationError(
            "non-finite residual variance".to_string(),
        ));
    }

    let k = num_params as f64;
    let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
    let aic = -2.0 * ll + 2.0 * k;
    let bic = -2.0 * ll + k * n_eff.ln();

    Ok(FitStatistics {
        residual_variance: variance,
        aic: aic.is_finite().then_some(aic),
        bic: bic.is_finite().then_some(bic),
    })
}

/// Box constraints for `num_coefficients` coefficients, optionally preceded
/// by an unbounded intercept. `None` when nothing is enforced.
pub fn coefficient_bounds(
    with_intercept: bool,
    num_coefficients: usize,
    enforce: bool,
) -> Option<Vec<(f64, f64)>> {
    enforce.then(|| {
        let mut bounds = Vec::with_capacity(num_coefficients + 1);
        if with_intercept {
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        bounds.extend(std::iter::repeat((-STATIONARY_BOUND, STATIONARY_BOUND)).take(num_coefficients));
        bounds
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn residuals_of_exact_ar1_are_zero() {
        let mut series = vec![4.0];
        for t in 1..20 {
            let prev: f64 = series[t - 1];
            series.push(0.5 * prev);
        }
        let residuals = conditional_residuals(&series, &[0.5], &[], 0.0, 1);
        assert!(residuals.iter().all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn residuals_before_start_are_conditioned_out() {
        let series = vec![1.0, 2.0, 3.0, 4.0];
        let residuals = conditional_residuals(&series, &[], &[], 0.0, 2);
        assert_eq!(residuals, vec![0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn ma_terms_feed_back_residuals() {
        // pred_t = 0.5 * e_{t-1}
        let series = vec![1.0, 1.0, 1.0];
        let residuals = conditional_residuals(&series, &[], &[0.5], 0.0, 0);
        assert_relative_eq!(residuals[0], 1.0);
        assert_relative_eq!(residuals[1], 0.5);
        assert_relative_eq!(residuals[2], 0.75);
    }

    #[test]
    fn css_maps_overflow_to_max() {
        let series = vec![1e300, -1e300, 1e300];
        let css = conditional_sum_of_squares(&series, &[], &[], 0.0, 0);
        assert_eq!(css, f64::MAX);
    }

    #[test]
    fn minimize_without_parameters_is_a_noop() {
        let params = minimize(|_| 1.0, &[], None).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn minimize_rejects_diverged_objective() {
        let result = minimize(|_| f64::MAX, &[0.1], None);
        assert!(matches!(result, Err(ForecastError::ComputationError(_))));
    }

    #[test]
    fn fit_statistics_handles_perfect_fit() {
        let stats = fit_statistics(&[0.0, 0.0, 0.0], 1, 2).unwrap();
        assert_eq!(stats.residual_variance, 0.0);
        assert!(stats.aic.is_none());
        assert!(stats.bic.is_none());
    }

    #[test]
    fn coefficient_bounds_shape() {
        assert!(coefficient_bounds(true, 3, false).is_none());
        let bounds = coefficient_bounds(true, 2, true).unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].0, f64::NEG_INFINITY);
        assert_eq!(bounds[2], (-STATIONARY_BOUND, STATIONARY_BOUND));
    }
}
