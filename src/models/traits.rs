//! Forecaster trait defining the common interface for all models.

use crate::core::month::is_month_start;
use crate::core::{Forecast, MonthlySeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// Common interface for all forecasting models.
///
/// Models are fitted on a gap-free [`MonthlySeries`] and can then produce a
/// point estimate for any month from the training start onwards: in-sample
/// months get the one-step-ahead fitted value, later months are forecast by
/// running the model forward from the end of training.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the monthly series.
    fn fit(&mut self, series: &MonthlySeries) -> Result<()>;

    /// Forecast `horizon` months starting the month after training ends.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// In-sample one-step-ahead predictions on the original scale, one per
    /// training month.
    fn fitted_values(&self) -> Option<Vec<f64>>;

    /// Get the residuals (actual - fitted) on the model's working scale.
    fn residuals(&self) -> Option<&[f64]>;

    /// The series the model was fitted on.
    fn training_series(&self) -> Option<&MonthlySeries>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.training_series().is_some()
    }

    /// Point estimates for every month in `[first, last]`.
    ///
    /// `first` must not precede the training start.
    fn predict_range(&self, first: NaiveDate, last: NaiveDate) -> Result<Forecast> {
        let training = self.training_series().ok_or(ForecastError::FitRequired)?;

        if !is_month_start(first) || !is_month_start(last) {
            return Err(ForecastError::InvalidParameter(
                "forecast dates must be the first of a month".to_string(),
            ));
        }
        if last < first {
            return Err(ForecastError::InvalidParameter(format!(
                "empty forecast range {first}..{last}"
            )));
        }

        let first_offset = training.offset_of(first);
        if first_offset < 0 {
            return Err(ForecastError::DateOutOfRange {
                date: first,
                start: training.start(),
            });
        }
        let last_offset = training.offset_of(last);
        let n = training.len() as i64;

        let mut values = Vec::new();
        if first_offset < n {
            let fitted = self.fitted_values().ok_or(ForecastError::FitRequired)?;
            let in_sample_end = last_offset.min(n - 1);
            values.extend_from_slice(&fitted[first_offset as usize..=in_sample_end as usize]);
        }
        if last_offset >= n {
            let horizon = (last_offset - n + 1) as usize;
            let skip = (first_offset.max(n) - n) as usize;
            let forecast = self.predict(horizon)?;
            values.extend_from_slice(&forecast.primary()[skip..]);
        }

        Ok(Forecast::from_values(first, values))
    }

    /// Point estimate for a single month.
    fn forecast_at(&self, date: NaiveDate) -> Result<f64> {
        self.predict_range(date, date)?
            .primary()
            .first()
            .copied()
            .ok_or_else(|| ForecastError::ComputationError(format!("no estimate for {date}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::{ARIMA, SARIMA};

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn make_series(n: usize) -> MonthlySeries {
        let values: Vec<f64> = (0..n).map(|i| 10.0 + (i % 12) as f64 + i as f64 * 0.1).collect();
        MonthlySeries::new(d(2017, 1), values).unwrap()
    }

    #[test]
    fn test_boxed_forecaster() {
        let model: Box<dyn Forecaster> = Box::new(ARIMA::new(1, 1, 0));
        assert_eq!(model.name(), "ARIMA");
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_boxed_forecaster_fit_predict() {
        let mut model: Box<dyn Forecaster> = Box::new(SARIMA::new((1, 0, 0), (0, 1, 0, 12)));
        model.fit(&make_series(36)).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert_eq!(forecast.start(), d(2020, 1));
    }

    #[test]
    fn predict_range_spans_training_end() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&make_series(36)).unwrap();

        let range = model.predict_range(d(2019, 11), d(2020, 2)).unwrap();
        assert_eq!(range.horizon(), 4);

        let fitted = model.fitted_values().unwrap();
        let ahead = model.predict(2).unwrap();
        assert_eq!(range.primary()[0], fitted[34]);
        assert_eq!(range.primary()[1], fitted[35]);
        assert_eq!(range.primary()[2], ahead.primary()[0]);
        assert_eq!(range.primary()[3], ahead.primary()[1]);
    }

    #[test]
    fn predict_range_out_of_sample_only() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&make_series(36)).unwrap();

        let range = model.predict_range(d(2020, 6), d(2020, 8)).unwrap();
        let ahead = model.predict(8).unwrap();
        assert_eq!(range.primary(), &ahead.primary()[5..8]);
        assert_eq!(model.forecast_at(d(2020, 6)).unwrap(), ahead.primary()[5]);
    }

    #[test]
    fn forecast_before_training_start_is_rejected() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&make_series(36)).unwrap();

        assert_eq!(
            model.forecast_at(d(2016, 12)),
            Err(ForecastError::DateOutOfRange {
                date: d(2016, 12),
                start: d(2017, 1)
            })
        );
    }

    #[test]
    fn predict_range_validates_arguments() {
        let mut model = ARIMA::new(1, 1, 0);
        assert_eq!(
            model.forecast_at(d(2020, 1)),
            Err(ForecastError::FitRequired)
        );

        model.fit(&make_series(36)).unwrap();
        assert!(model.predict_range(d(2020, 3), d(2020, 1)).is_err());
        let mid_month = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();
        assert!(model.forecast_at(mid_month).is_err());
    }
}
