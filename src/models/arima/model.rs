//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::month::add_months;
use crate::core::{Forecast, MonthlySeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::css::{
    coefficient_bounds, conditional_residuals, conditional_sum_of_squares, fit_statistics, minimize,
};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether an intercept is estimated (only for undifferenced series).
    pub fn has_intercept(&self) -> bool {
        self.d == 0
    }

    /// Total number of estimated parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_intercept())
    }

    /// Shortest training series this specification can be fitted on.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(5, 1, 0)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ARIMA {
    /// Model specification.
    spec: ARIMASpec,
    /// Bound coefficients to (-0.99, 0.99) while fitting.
    enforce_stationarity: bool,
    /// AR coefficients.
    ar_coefficients: Vec<f64>,
    /// MA coefficients.
    ma_coefficients: Vec<f64>,
    /// Mean of the series; zero when differenced.
    intercept: f64,
    /// Training series (needed for integration).
    training: Option<MonthlySeries>,
    /// Residuals on the differenced scale.
    residuals: Option<Vec<f64>>,
    /// Residual variance.
    residual_variance: Option<f64>,
    /// AIC.
    aic: Option<f64>,
    /// BIC.
    bic: Option<f64>,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    /// Create an unfitted model from a specification.
    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            enforce_stationarity: false,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            training: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
        }
    }

    /// Restrict coefficients to the stationary/invertible box while fitting.
    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = enforce;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Residual variance on the differenced scale.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    fn start(&self) -> usize {
        self.spec.p.max(self.spec.q)
    }

    /// Estimate parameters using conditional least squares.
    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let p = self.spec.p;
        let q = self.spec.q;
        let start = self.start();
        let with_intercept = self.spec.has_intercept();
        let offset = usize::from(with_intercept);

        let mean = if with_intercept {
            diff_series.iter().sum::<f64>() / diff_series.len() as f64
        } else {
            0.0
        };

        let mut initial = Vec::with_capacity(self.spec.num_params());
        if with_intercept {
            initial.push(mean);
        }
        initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));

        let bounds = coefficient_bounds(with_intercept, p + q, self.enforce_stationarity);

        let optimal = minimize(
            |params| {
                let intercept = if with_intercept { params[0] } else { 0.0 };
                let ar = &params[offset..offset + p];
                let ma = &params[offset + p..];
                conditional_sum_of_squares(diff_series, ar, ma, intercept, start)
            },
            &initial,
            bounds.as_deref(),
        )?;

        self.intercept = if with_intercept && !optimal.is_empty() {
            optimal[0]
        } else {
            mean
        };
        self.ar_coefficients = optimal.get(offset..offset + p).unwrap_or(&[]).to_vec();
        self.ma_coefficients = optimal.get(offset + p..).unwrap_or(&[]).to_vec();
        Ok(())
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &MonthlySeries) -> Result<()> {
        let values = series.values();
        let min_len = self.spec.min_observations();

        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let diff_series = difference(values, self.spec.d);
        self.estimate_parameters(&diff_series)?;

        let start = self.start();
        let residuals = conditional_residuals(
            &diff_series,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.intercept,
            start,
        );
        let stats = fit_statistics(&residuals, start, self.spec.num_params())?;

        self.residual_variance = Some(stats.residual_variance);
        self.aic = stats.aic;
        self.bic = stats.bic;
        self.residuals = Some(residuals);
        self.training = Some(series.clone());

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let training = self.training.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;
        let first = add_months(training.end(), 1).ok_or_else(|| {
            ForecastError::ComputationError("forecast start outside calendar range".to_string())
        })?;

        if horizon == 0 {
            return Ok(Forecast::empty(first));
        }

        let original = training.values();
        let mut extended_diff = difference(original, self.spec.d);
        let observed = extended_diff.len();
        let mut extended_residuals = residuals.clone();
        extended_diff.reserve(horizon);
        extended_residuals.reserve(horizon);

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for (i, a) in self.ar_coefficients.iter().enumerate().take(t) {
                pred += a * (extended_diff[t - 1 - i] - self.intercept);
            }
            // Future shocks are zero; only observed residuals contribute.
            for (i, m) in self.ma_coefficients.iter().enumerate().take(t) {
                pred += m * extended_residuals[t - 1 - i];
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[observed..];
        let predictions = integrate(forecast_diff, original, self.spec.d);

        Ok(Forecast::from_values(first, predictions))
    }

    fn fitted_values(&self) -> Option<Vec<f64>> {
        let training = self.training.as_ref()?;
        let residuals = self.residuals.as_ref()?;
        let lost = training.len().saturating_sub(residuals.len());
        Some(
            training
                .values()
                .iter()
                .enumerate()
                .map(|(i, y)| match i.checked_sub(lost) {
                    Some(j) => y - residuals[j],
                    None => *y,
                })
                .collect(),
        )
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn training_series(&self) -> Option<&MonthlySeries> {
        self.training.as_ref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn monthly(values: Vec<f64>) -> MonthlySeries {
        MonthlySeries::new(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn arima_basic_fit() {
        let values: Vec<f64> = (0..50)
            .map(|i| 10.0 + 0.5 * i as f64 + (i as f64 * 0.3).sin())
            .collect();

        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&monthly(values)).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert_eq!(forecast.start(), NaiveDate::from_ymd_opt(2019, 3, 1).unwrap());
    }

    #[test]
    fn arima_ar1_recovers_coefficient() {
        let mut values = vec![10.0];
        for i in 1..100 {
            let prev: f64 = values[i - 1];
            values.push(0.7 * prev + (i as f64 * 0.1).sin());
        }

        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&monthly(values)).unwrap();

        assert!(model.ar_coefficients()[0] > 0.3);
    }

    #[test]
    fn arima_differenced_ar1_is_recovered_exactly() {
        // First differences follow w_t = 0.6 * w_{t-1} with no noise.
        let mut diffs = vec![10.0_f64];
        for t in 1..40 {
            diffs.push(0.6 * diffs[t - 1]);
        }
        let values: Vec<f64> = diffs
            .iter()
            .scan(100.0, |level, w| {
                *level += w;
                Some(*level)
            })
            .collect();

        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&monthly(values)).unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.6, epsilon = 1e-3);
    }

    #[test]
    fn arima_with_differencing_continues_trend() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + 2.0 * i as f64).collect();
        let last = *values.last().unwrap();

        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&monthly(values)).unwrap();

        let forecast = model.predict(5).unwrap();
        assert!(forecast.primary()[0] > last - 5.0);
    }

    #[test]
    fn arima_random_walk_forecast_is_flat() {
        let values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 5.0 } else { 7.0 }).collect();
        let last = *values.last().unwrap();

        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&monthly(values)).unwrap();

        let forecast = model.predict(3).unwrap();
        for v in forecast.primary() {
            assert_relative_eq!(*v, last, epsilon = 1e-12);
        }
    }

    #[test]
    fn arima_fitted_values_align_with_training() {
        let values: Vec<f64> = (0..40).map(|i| 20.0 + (i as f64 * 0.5).cos() * 3.0).collect();
        let mut model = ARIMA::new(2, 1, 0);
        model.fit(&monthly(values.clone())).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert_eq!(fitted.len(), values.len());
        // The first observation is lost to differencing and reproduced as is.
        assert_eq!(fitted[0], values[0]);
    }

    #[test]
    fn arima_information_criteria() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();

        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&monthly(values)).unwrap();

        assert!(model.aic().is_some());
        assert!(model.bic().is_some());
        assert!(model.residual_variance().unwrap() > 0.0);
    }

    #[test]
    fn arima_insufficient_data() {
        let mut model = ARIMA::new(2, 1, 1);
        assert!(matches!(
            model.fit(&monthly(vec![1.0, 2.0, 3.0])),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 1);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_zero_horizon() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&monthly(values)).unwrap();

        assert_eq!(model.predict(0).unwrap().horizon(), 0);
    }

    #[test]
    fn arima_spec() {
        let spec = ARIMASpec::new(2, 1, 3);
        assert_eq!(spec.num_params(), 5); // no intercept when differenced
        assert_eq!(ARIMASpec::new(2, 0, 3).num_params(), 6);
        assert_eq!(ARIMASpec::default(), ARIMASpec::new(5, 1, 0));
    }

    #[test]
    fn arima_enforced_bounds_hold() {
        let values: Vec<f64> = (0..60).map(|i| 1.05_f64.powi(i)).collect();
        let mut model = ARIMA::new(1, 0, 0).with_enforce_stationarity(true);
        model.fit(&monthly(values)).unwrap();
        assert!(model.ar_coefficients()[0].abs() <= 0.99);
    }
}
