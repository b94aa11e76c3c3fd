//! Forecast result structure for holding monthly point predictions.

use crate::core::month::{add_months, months_between};
use chrono::NaiveDate;

/// Point predictions for a run of consecutive months.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Month of the first prediction.
    start: NaiveDate,
    /// Point predictions, one per month.
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast anchored at `start`.
    pub fn empty(start: NaiveDate) -> Self {
        Self {
            start,
            point: Vec::new(),
        }
    }

    /// Create a forecast from point predictions starting at `start`.
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Self {
        Self {
            start,
            point: values,
        }
    }

    /// Month of the first prediction.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// All point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    /// Month of the last prediction.
    pub fn end(&self) -> Option<NaiveDate> {
        self.point
            .len()
            .checked_sub(1)
            .and_then(|last| add_months(self.start, last as i64))
    }

    /// Prediction for `date`, if covered.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let offset = usize::try_from(months_between(self.start, date)).ok()?;
        self.point.get(offset).copied()
    }

    /// Predictions for each of `dates`, in order; `None` when any date is uncovered.
    pub fn select(&self, dates: &[NaiveDate]) -> Option<Vec<f64>> {
        dates.iter().map(|&d| self.value_at(d)).collect()
    }
}
