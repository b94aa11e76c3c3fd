//! Monthly re-indexing and the fixed train/test split.

use crate::core::month::{add_months, months_between};
use crate::core::{CategorySeries, MonthlySeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// Last month (inclusive) of the training window.
pub const TRAIN_END: NaiveDate = match NaiveDate::from_ymd_opt(2019, 12, 1) {
    Some(date) => date,
    None => panic!("invalid TRAIN_END"),
};

/// First month (inclusive) of the test window.
pub const TEST_START: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date,
    None => panic!("invalid TEST_START"),
};

/// A category's observations on a strictly consecutive monthly grid.
///
/// Slot `i` is the month `start + i`. Gaps are forward-filled; a slot with
/// no earlier observation to carry forward stays `None` and is left out of
/// the split.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyGrid {
    category: String,
    start: NaiveDate,
    values: Vec<Option<f64>>,
    filled: usize,
}

impl MonthlyGrid {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of slots filled from a previous month.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Iterate over `(month, value)` for every slot.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        let start = self.start;
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, v)| Some((add_months(start, i as i64)?, *v)))
    }

    /// Split defined slots at the fixed boundary.
    pub fn split(&self) -> TrainTestSplit {
        let mut split = TrainTestSplit {
            category: self.category.clone(),
            train: Vec::new(),
            test: Vec::new(),
        };
        for (date, value) in self.iter() {
            let Some(value) = value else { continue };
            if date <= TRAIN_END {
                split.train.push((date, value));
            } else if date >= TEST_START {
                split.test.push((date, value));
            }
        }
        split
    }
}

/// Train and test points of one category, each ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub category: String,
    pub train: Vec<(NaiveDate, f64)>,
    pub test: Vec<(NaiveDate, f64)>,
}

impl TrainTestSplit {
    /// Training points as a gap-free series for model fitting.
    pub fn train_series(&self) -> Result<MonthlySeries> {
        let (start, _) = *self.train.first().ok_or(ForecastError::EmptyData)?;
        let values = self.train.iter().map(|(_, v)| *v).collect();
        MonthlySeries::new(start, values)
    }

    pub fn test_dates(&self) -> Vec<NaiveDate> {
        self.test.iter().map(|(d, _)| *d).collect()
    }

    pub fn test_values(&self) -> Vec<f64> {
        self.test.iter().map(|(_, v)| *v).collect()
    }
}

/// Re-index a category onto consecutive months from its first to its last
/// observation, forward-filling gaps.
///
/// Two observations in the same month cannot share a slot and fail with
/// [`ForecastError::FrequencyAlignment`].
pub fn build_grid(series: &CategorySeries) -> Result<MonthlyGrid> {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return Err(ForecastError::EmptyData);
    };

    let len = months_between(first, last) as usize + 1;
    let mut slots: Vec<Option<f64>> = vec![None; len];

    for point in series.points() {
        let idx = months_between(first, point.date) as usize;
        if slots[idx].is_some() {
            return Err(ForecastError::FrequencyAlignment(format!(
                "duplicate observation for {} in '{}'",
                point.date.format("%Y-%m"),
                series.category()
            )));
        }
        slots[idx] = Some(point.value as f64);
    }

    let mut filled = 0;
    let mut last_seen = None;
    for slot in slots.iter_mut() {
        match slot {
            Some(v) => last_seen = Some(*v),
            None => {
                if last_seen.is_some() {
                    filled += 1;
                }
                *slot = last_seen;
            }
        }
    }

    Ok(MonthlyGrid {
        category: series.category().to_string(),
        start: first,
        values: slots,
        filled,
    })
}
