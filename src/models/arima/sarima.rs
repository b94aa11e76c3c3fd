//! Seasonal ARIMA: SARIMA(p, d, q)(P, D, Q)\[s\].
//!
//! The model is
//!
//! ```text
//! phi(B) Phi(B^s) (1 - B)^d (1 - B^s)^D y_t = theta(B) Theta(B^s) e_t
//! ```
//!
//! Coefficients are estimated by conditional sum of squares on the
//! differenced series. Forecasts run the fully expanded recursion on the
//! original scale, so integrating the seasonal and regular differences back
//! happens inside the same loop.

use crate::core::month::add_months;
use crate::core::{Forecast, MonthlySeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::css::{
    coefficient_bounds, conditional_residuals, conditional_sum_of_squares, fit_statistics, minimize,
};
use crate::models::arima::diff::{
    difference, differencing_polynomial, lag_polynomial, poly_mul, seasonal_difference,
};
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};

/// SARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Seasonal AR order (P).
    pub seasonal_p: usize,
    /// Seasonal differencing order (D).
    pub seasonal_d: usize,
    /// Seasonal MA order (Q).
    pub seasonal_q: usize,
    /// Season length in months.
    pub period: usize,
}

impl SARIMASpec {
    pub fn new(
        (p, d, q): (usize, usize, usize),
        (seasonal_p, seasonal_d, seasonal_q, period): (usize, usize, usize, usize),
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    /// Observations consumed by differencing.
    pub fn lost_to_differencing(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    pub fn has_intercept(&self) -> bool {
        self.lost_to_differencing() == 0
    }

    pub fn num_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q + usize::from(self.has_intercept())
    }

    /// Highest lag of the expanded AR polynomial on the differenced scale.
    pub fn ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Shortest training series this specification can be fitted on.
    ///
    /// The forecast recursion needs a full window of history and the
    /// estimator needs a few residuals beyond the parameter count.
    pub fn min_observations(&self) -> usize {
        let lost = self.lost_to_differencing();
        (lost + self.num_params() + 3).max(lost + self.ar_lag() + 1)
    }

    fn validate(&self) -> Result<()> {
        let seasonal = self.seasonal_p + self.seasonal_d + self.seasonal_q > 0;
        if seasonal && self.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                self.period
            )));
        }
        Ok(())
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new((5, 1, 0), (1, 1, 1, 12))
    }
}

/// Seasonal ARIMA forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SARIMA {
    spec: SARIMASpec,
    enforce_stationarity: bool,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    seasonal_ar_coefficients: Vec<f64>,
    seasonal_ma_coefficients: Vec<f64>,
    intercept: f64,
    training: Option<MonthlySeries>,
    /// Residuals aligned with the differenced series.
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
}

impl SARIMA {
    pub fn new(order: (usize, usize, usize), seasonal_order: (usize, usize, usize, usize)) -> Self {
        Self::from_spec(SARIMASpec::new(order, seasonal_order))
    }

    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            enforce_stationarity: false,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            seasonal_ar_coefficients: vec![],
            seasonal_ma_coefficients: vec![],
            intercept: 0.0,
            training: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
        }
    }

    /// Restrict coefficients to (-0.99, 0.99) while fitting.
    ///
    /// Off by default: real accident series are rarely stationary after
    /// differencing and the unconstrained fit is what gets evaluated.
    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = enforce;
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Expanded `phi(B) Phi(B^s)` as lag coefficients (index 0 = lag 1).
    fn expanded_ar(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
        let poly = poly_mul(
            &lag_polynomial(ar, 1, -1.0),
            &lag_polynomial(seasonal_ar, period.max(1), -1.0),
        );
        poly.iter().skip(1).map(|c| -c).collect()
    }

    /// Expanded `theta(B) Theta(B^s)` as lag coefficients (index 0 = lag 1).
    fn expanded_ma(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
        let poly = poly_mul(
            &lag_polynomial(ma, 1, 1.0),
            &lag_polynomial(seasonal_ma, period.max(1), 1.0),
        );
        poly.into_iter().skip(1).collect()
    }

    fn differenced(&self, values: &[f64]) -> Vec<f64> {
        difference(
            &seasonal_difference(values, self.spec.seasonal_d, self.spec.period),
            self.spec.d,
        )
    }

    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let SARIMASpec {
            p,
            q,
            seasonal_p,
            seasonal_q,
            period,
            ..
        } = self.spec;
        let with_intercept = self.spec.has_intercept();
        let offset = usize::from(with_intercept);
        let start = p;

        let mean = if with_intercept {
            w.iter().sum::<f64>() / w.len() as f64
        } else {
            0.0
        };

        let mut initial = Vec::with_capacity(self.spec.num_params());
        if with_intercept {
            initial.push(mean);
        }
        initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..seasonal_p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..seasonal_q).map(|i| 0.1 / (i + 1) as f64));

        let bounds = coefficient_bounds(
            with_intercept,
            p + seasonal_p + q + seasonal_q,
            self.enforce_stationarity,
        );

        // Parameter layout: [intercept?, phi.., Phi.., theta.., Theta..]
        let split = move |params: &[f64]| {
            let (ar, rest) = params[offset..].split_at(p);
            let (sar, rest) = rest.split_at(seasonal_p);
            let (ma, sma) = rest.split_at(q);
            (
                ar.to_vec(),
                sar.to_vec(),
                ma.to_vec(),
                sma[..seasonal_q].to_vec(),
            )
        };

        let optimal = minimize(
            |params| {
                let intercept = if with_intercept { params[0] } else { 0.0 };
                let (ar, sar, ma, sma) = split(params);
                conditional_sum_of_squares(
                    w,
                    &Self::expanded_ar(&ar, &sar, period),
                    &Self::expanded_ma(&ma, &sma, period),
                    intercept,
                    start,
                )
            },
            &initial,
            bounds.as_deref(),
        )?;

        if optimal.is_empty() {
            self.intercept = mean;
            return Ok(());
        }

        let (ar, sar, ma, sma) = split(&optimal);
        self.intercept = if with_intercept { optimal[0] } else { 0.0 };
        self.ar_coefficients = ar;
        self.seasonal_ar_coefficients = sar;
        self.ma_coefficients = ma;
        self.seasonal_ma_coefficients = sma;
        Ok(())
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::from_spec(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &MonthlySeries) -> Result<()> {
        self.spec.validate()?;

        let values = series.values();
        let needed = self.spec.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = self.differenced(values);
        self.estimate_parameters(&w)?;

        let start = self.spec.p;
        let residuals = conditional_residuals(
            &w,
            &Self::expanded_ar(&self.ar_coefficients, &self.seasonal_ar_coefficients, self.spec.period),
            &Self::expanded_ma(&self.ma_coefficients, &self.seasonal_ma_coefficients, self.spec.period),
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

        let period = self.spec.period;
        let arma_ar = lag_polynomial(&self.ar_coefficients, 1, -1.0);
        let seasonal_ar = lag_polynomial(&self.seasonal_ar_coefficients, period.max(1), -1.0);
        let full_ar = poly_mul(
            &poly_mul(&arma_ar, &seasonal_ar),
            &differencing_polynomial(self.spec.d, self.spec.seasonal_d, period),
        );
        let ar: Vec<f64> = full_ar.iter().skip(1).map(|c| -c).collect();
        let ma = Self::expanded_ma(&self.ma_coefficients, &self.seasonal_ma_coefficients, period);

        // Work on deviations from the intercept (zero whenever differenced).
        let mu = self.intercept;
        let n = training.len();
        let lost = n.saturating_sub(residuals.len());
        let mut z: Vec<f64> = training.values().iter().map(|y| y - mu).collect();
        let mut shocks: Vec<f64> = std::iter::repeat(0.0)
            .take(lost)
            .chain(residuals.iter().copied())
            .collect();
        z.reserve(horizon);
        shocks.reserve(horizon);

        for _ in 0..horizon {
            let t = z.len();
            let mut pred = 0.0;
            for (k, a) in ar.iter().enumerate().take(t) {
                pred += a * z[t - 1 - k];
            }
            for (k, m) in ma.iter().enumerate().take(t) {
                pred += m * shocks[t - 1 - k];
            }
            z.push(pred);
            shocks.push(0.0);
        }

        let predictions = z[n..].iter().map(|v| v + mu).collect();
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
        "SARIMA"
    }
}
