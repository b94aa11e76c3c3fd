//! Source table ingest and normalization.
//!
//! Turns the raw accident table into one clean [`CategorySeries`] per
//! category. Every row goes through the same staged checks and either
//! becomes an [`ObservationPoint`] or is dropped with a [`DropReason`], so
//! each discard decision can be audited line by line.

use crate::core::{CategorySeries, ObservationPoint};
use crate::error::DataError;
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Row type selecting the "all subtypes combined" rows.
pub const AGGREGATE_KIND: &str = "insgesamt";

/// Last calendar year included in the modeled period.
pub const LAST_MODELED_YEAR: i32 = 2020;

/// Number of leading columns the normalizer reads.
pub const SOURCE_COLUMNS: usize = 5;

/// One row of the source table, tokens kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line in the source file (0 when not read from a file).
    pub line: usize,
    pub category: String,
    pub kind: String,
    pub year: String,
    /// Month token; may embed the year, e.g. `"201901"`.
    pub month: String,
    /// Value token; empty means "no value recorded".
    pub value: String,
    /// False when the source row had fewer than five fields.
    pub complete: bool,
}

impl RawRecord {
    pub fn new(
        category: impl Into<String>,
        kind: impl Into<String>,
        year: impl Into<String>,
        month: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            line: 0,
            category: category.into(),
            kind: kind.into(),
            year: year.into(),
            month: month.into(),
            value: value.into(),
            complete: true,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// Why a row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    /// Fewer than five fields in the row.
    MissingColumns,
    /// Row type is not the aggregate sentinel.
    NotAggregate,
    UnparsableYear,
    YearAfterModeledPeriod,
    UnparsableMonth,
    MonthOutOfRange,
    /// Non-empty value token that is not a non-negative integer.
    MalformedValue,
    InvalidDate,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::MissingColumns => "missing columns",
            DropReason::NotAggregate => "not an aggregate row",
            DropReason::UnparsableYear => "unparsable year",
            DropReason::YearAfterModeledPeriod => "year after modeled period",
            DropReason::UnparsableMonth => "unparsable month",
            DropReason::MonthOutOfRange => "month out of range",
            DropReason::MalformedValue => "malformed value",
            DropReason::InvalidDate => "invalid date",
        };
        f.write_str(text)
    }
}

/// Outcome of normalizing a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Kept(ObservationPoint),
    Dropped(DropReason),
}

/// A dropped row and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDrop {
    pub line: usize,
    pub reason: DropReason,
}

/// Bookkeeping for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub drops: Vec<RowDrop>,
}

impl NormalizeReport {
    /// Dropped rows counted per reason.
    pub fn drop_counts(&self) -> BTreeMap<DropReason, usize> {
        let mut counts = BTreeMap::new();
        for drop in &self.drops {
            *counts.entry(drop.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Date range and size of one normalized category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub points: usize,
}

/// Normalized output: series sorted by category, plus the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedData {
    pub series: Vec<CategorySeries>,
    pub report: NormalizeReport,
}

impl NormalizedData {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.category())
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.series
            .iter()
            .filter_map(|s| {
                Some(CategorySummary {
                    category: s.category().to_string(),
                    first: s.first_date()?,
                    last: s.last_date()?,
                    points: s.len(),
                })
            })
            .collect()
    }
}

/// Run one row through every normalization stage.
pub fn normalize_record(record: &RawRecord) -> RowOutcome {
    match parse_record(record) {
        Ok(point) => RowOutcome::Kept(point),
        Err(reason) => RowOutcome::Dropped(reason),
    }
}

fn parse_record(record: &RawRecord) -> Result<ObservationPoint, DropReason> {
    if !record.complete {
        return Err(DropReason::MissingColumns);
    }
    if record.kind != AGGREGATE_KIND {
        return Err(DropReason::NotAggregate);
    }
    let year = parse_year(&record.year)?;
    let month = parse_month(&record.month)?;
    let value = parse_value(&record.value)?;
    let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or(DropReason::InvalidDate)?;

    Ok(ObservationPoint {
        category: record.category.clone(),
        date,
        value,
    })
}

fn parse_year(token: &str) -> Result<i32, DropReason> {
    let year: i32 = token
        .trim()
        .parse()
        .map_err(|_| DropReason::UnparsableYear)?;
    if year > LAST_MODELED_YEAR {
        return Err(DropReason::YearAfterModeledPeriod);
    }
    Ok(year)
}

/// The month is the integer in the token's last two characters.
fn parse_month(token: &str) -> Result<u32, DropReason> {
    let token = token.trim();
    let tail_start = token
        .char_indices()
        .rev()
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let month: i64 = token[tail_start..]
        .parse()
        .map_err(|_| DropReason::UnparsableMonth)?;
    if !(1..=12).contains(&month) {
        return Err(DropReason::MonthOutOfRange);
    }
    Ok(month as u32)
}

fn parse_value(token: &str) -> Result<u64, DropReason> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(0);
    }
    token.parse().map_err(|_| DropReason::MalformedValue)
}

/// Normalize raw rows into per-category series.
///
/// Fails only when no row survives; individual bad rows are recorded in the
/// report and skipped.
pub fn normalize(
    rows: impl IntoIterator<Item = RawRecord>,
) -> Result<NormalizedData, DataError> {
    let mut report = NormalizeReport::default();
    let mut by_category: BTreeMap<String, Vec<ObservationPoint>> = BTreeMap::new();

    for record in rows {
        report.rows_read += 1;
        match normalize_record(&record) {
            RowOutcome::Kept(point) => {
                report.rows_kept += 1;
                by_category
                    .entry(point.category.clone())
                    .or_default()
                    .push(point);
            }
            RowOutcome::Dropped(reason) => {
                debug!(line = record.line, %reason, "dropping row");
                report.drops.push(RowDrop {
                    line: record.line,
                    reason,
                });
            }
        }
    }

    finish(by_category, report)
}

fn finish(
    by_category: BTreeMap<String, Vec<ObservationPoint>>,
    report: NormalizeReport,
) -> Result<NormalizedData, DataError> {
    if report.rows_kept == 0 {
        return Err(DataError::NoUsableRows {
            rows_read: report.rows_read,
        });
    }

    let series = by_category
        .into_iter()
        .map(|(category, points)| CategorySeries::new(category, points))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DataError::Schema(e.to_string()))?;

    info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        categories = series.len(),
        "normalized source data"
    );

    Ok(NormalizedData { series, report })
}

/// Read the first five columns of a delimited source file, header skipped.
pub fn read_source(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(file)
}

/// Read raw records from any reader producing CSV with a header row.
pub fn read_records(reader: impl std::io::Read) -> Result<Vec<RawRecord>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < SOURCE_COLUMNS {
        return Err(DataError::Schema(format!(
            "expected at least {SOURCE_COLUMNS} columns, found {}",
            headers.len()
        )));
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        records.push(raw_from_csv(&result?, line));
    }
    Ok(records)
}

fn raw_from_csv(record: &StringRecord, line: usize) -> RawRecord {
    let field = |i: usize| record.get(i).unwrap_or_default().to_string();
    let mut raw = RawRecord::new(field(0), field(1), field(2), field(3), field(4)).at_line(line);
    raw.complete = record.len() >= SOURCE_COLUMNS;
    raw
}

/// Read and normalize a source file in one step.
pub fn load_and_normalize(path: impl AsRef<Path>) -> Result<NormalizedData, DataError> {
    let records = read_source(path)?;
    normalize(records)
}
