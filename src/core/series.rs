//! Observation and monthly series types.

use crate::core::month::{add_months, is_month_start, months_between};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cleaned observation: a category's count for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub category: String,
    /// Always the first day of a month.
    pub date: NaiveDate,
    pub value: u64,
}

/// All observations of one category, sorted ascending by date.
///
/// The series may contain gaps; [`crate::series::build_grid`] re-indexes it
/// onto a strict monthly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeries {
    category: String,
    points: Vec<ObservationPoint>,
}

impl CategorySeries {
    /// Create a series, sorting the points by date.
    ///
    /// Points belonging to another category are rejected.
    pub fn new(category: impl Into<String>, mut points: Vec<ObservationPoint>) -> Result<Self> {
        let category = category.into();
        if let Some(stray) = points.iter().find(|p| p.category != category) {
            return Err(ForecastError::InvalidParameter(format!(
                "point for category '{}' in series '{}'",
                stray.category, category
            )));
        }
        points.sort_by_key(|p| p.date);
        Ok(Self { category, points })
    }

    /// Convenience constructor from `(date, value)` pairs.
    pub fn from_values(
        category: impl Into<String>,
        values: impl IntoIterator<Item = (NaiveDate, u64)>,
    ) -> Result<Self> {
        let category = category.into();
        let points = values
            .into_iter()
            .map(|(date, value)| ObservationPoint {
                category: category.clone(),
                date,
                value,
            })
            .collect();
        Self::new(category, points)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest observation date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Latest observation date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// A gap-free monthly series: `values[i]` belongs to `start + i` months.
///
/// This is the shape every model is fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Create a monthly series starting at `start`.
    ///
    /// `start` must be the first of a month and all values must be finite.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if !is_month_start(start) {
            return Err(ForecastError::InvalidParameter(format!(
                "series start {start} is not the first of a month"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".to_string(),
            ));
        }
        Ok(Self { start, values })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Date of the last value.
    pub fn end(&self) -> NaiveDate {
        add_months(self.start, self.values.len() as i64 - 1).unwrap_or(self.start)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Date of the `index`-th value.
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        (index < self.values.len())
            .then(|| add_months(self.start, index as i64))
            .flatten()
    }

    /// Signed month offset of `date` from the series start.
    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        months_between(self.start, date)
    }

    /// Value observed at `date`, if it falls inside the series.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let offset = usize::try_from(self.offset_of(date)).ok()?;
        self.values.get(offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn category_series_sorts_points() {
        let series =
            CategorySeries::from_values("X", vec![(d(2019, 3), 3), (d(2019, 1), 1), (d(2019, 2), 2)])
                .unwrap();
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2019, 1), d(2019, 2), d(2019, 3)]);
        assert_eq!(series.first_date(), Some(d(2019, 1)));
        assert_eq!(series.last_date(), Some(d(2019, 3)));
    }

    #[test]
    fn category_series_rejects_foreign_points() {
        let stray = ObservationPoint {
            category: "Y".into(),
            date: d(2019, 1),
            value: 1,
        };
        assert!(matches!(
            CategorySeries::new("X", vec![stray]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn monthly_series_dates() {
        let series = MonthlySeries::new(d(2019, 11), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.end(), d(2020, 1));
        assert_eq!(series.date_at(1), Some(d(2019, 12)));
        assert_eq!(series.date_at(3), None);
        assert_eq!(series.offset_of(d(2019, 10)), -1);
        assert_eq!(series.value_at(d(2020, 1)), Some(3.0));
        assert_eq!(series.value_at(d(2020, 2)), None);
    }

    #[test]
    fn monthly_series_validation() {
        assert_eq!(
            MonthlySeries::new(d(2019, 1), vec![]),
            Err(ForecastError::EmptyData)
        );
        let mid_month = NaiveDate::from_ymd_opt(2019, 1, 15).unwrap();
        assert!(MonthlySeries::new(mid_month, vec![1.0]).is_err());
        assert!(MonthlySeries::new(d(2019, 1), vec![1.0, f64::NAN]).is_err());
    }
}
