//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::io::Write as _;
use tempfile::NamedTempFile;

pub const HEADER: &str = "MONATSZAHL,AUSPRAEGUNG,JAHR,MONAT,WERT,VORJAHRESWERT";

/// Seasonal monthly counts with drift and deterministic noise.
///
/// `month_index` 0 is January of the first year.
pub fn seasonal_count(month_index: usize, base: f64) -> u64 {
    const SEASON: [f64; 12] = [-6.0, -8.0, -3.0, 0.0, 4.0, 7.0, 9.0, 8.0, 5.0, 1.0, -3.0, -5.0];
    let seed: u64 = 42;
    let noise = ((seed.wrapping_mul(month_index as u64 + 1) % 1000) as f64 - 500.0) / 250.0;
    let value = base + SEASON[month_index % 12] + 0.15 * month_index as f64 + noise;
    value.round().max(0.0) as u64
}

/// CSV rows for `category` covering `months` months from January of `first_year`.
pub fn category_rows(category: &str, first_year: i32, months: usize, base: f64) -> String {
    let mut out = String::new();
    for i in 0..months {
        let year = first_year + (i / 12) as i32;
        let month = i % 12 + 1;
        let value = seasonal_count(i, base);
        writeln!(out, "{category},insgesamt,{year},{year}{month:02},{value},").unwrap();
        // Sub-breakdown row that must never reach the models.
        writeln!(out, "{category},Verletzte und Getötete,{year},{year}{month:02},{},", value / 3)
            .unwrap();
        if month == 12 {
            // Yearly total row carried by the source table.
            writeln!(out, "{category},insgesamt,{year},Summe,{},", value * 12).unwrap();
        }
    }
    out
}

/// Write a source table with a header and the given row blocks.
pub fn write_source(blocks: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for block in blocks {
        file.write_all(block.as_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}
