//! Month-start calendar arithmetic.
//!
//! Every date handled by the pipeline is the first day of a month. These
//! helpers convert between such dates and a linear month ordinal so grids
//! and forecast offsets can be computed with plain integer arithmetic.

use chrono::{Datelike, NaiveDate};

/// Linear month number: `year * 12 + (month - 1)`.
pub fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Inverse of [`month_ordinal`]. Returns `None` outside chrono's date range.
pub fn from_ordinal(ordinal: i64) -> Option<NaiveDate> {
    let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
    let month0 = ordinal.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

/// Signed number of months from `from` to `to`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    month_ordinal(to) - month_ordinal(from)
}

/// Shift a month-start date by `months` (may be negative).
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    from_ordinal(month_ordinal(date).checked_add(months)?)
}

/// Whether `date` falls on the first of its month.
pub fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}

/// Build the first-of-month date for `(year, month)`.
pub fn month_date(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn ordinal_round_trips() {
        for date in [d(2000, 1), d(2019, 12), d(2020, 6), d(1, 1)] {
            assert_eq!(from_ordinal(month_ordinal(date)), Some(date));
        }
    }

    #[test]
    fn months_between_crosses_years() {
        assert_eq!(months_between(d(2019, 12), d(2020, 1)), 1);
        assert_eq!(months_between(d(2017, 1), d(2019, 12)), 35);
        assert_eq!(months_between(d(2020, 1), d(2019, 1)), -12);
    }

    #[test]
    fn add_months_handles_negative_offsets() {
        assert_eq!(add_months(d(2020, 1), -1), Some(d(2019, 12)));
        assert_eq!(add_months(d(2019, 11), 14), Some(d(2021, 1)));
    }

    #[test]
    fn add_months_out_of_range() {
        assert_eq!(add_months(d(2020, 1), i64::MAX), None);
    }

    #[test]
    fn only_the_first_is_a_month_start() {
        let mid = NaiveDate::from_ymd_opt(2020, 2, 17).unwrap();
        assert!(!is_month_start(mid));
        assert!(is_month_start(d(2020, 2)));
    }

    #[test]
    fn month_date_rejects_invalid_month() {
        assert_eq!(month_date(2021, 13), None);
        assert_eq!(month_date(2021, 0), None);
        assert_eq!(month_date(2021, 5), Some(d(2021, 5)));
    }
}
