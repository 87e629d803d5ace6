//! Per-year breakdown
//!
//! Groups tallies by the calendar year of a date column, for charts that
//! plot one series per year.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crashtally_core::{Row, TallyTable};

use crate::category::{CategoryExtractor, MatchOutcome};

static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/(\d{4})").expect("valid date pattern"));

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-\d{1,2}-\d{1,2}").expect("valid date pattern"));

/// Extract the year from `MM/DD/YYYY` or `YYYY-MM-DD` text
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    SLASH_DATE
        .captures(value)
        .or_else(|| ISO_DATE.captures(value))
        .and_then(|caps| caps[1].parse().ok())
}

/// Tally tables keyed by year
#[derive(Debug, Clone)]
pub struct YearlyTally {
    date_field: String,
    tables: BTreeMap<i32, TallyTable>,
}

impl YearlyTally {
    /// Group rows by the year found in `date_field`
    pub fn new(date_field: impl Into<String>) -> Self {
        Self {
            date_field: date_field.into(),
            tables: BTreeMap::new(),
        }
    }

    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    /// Apply an already computed outcome to the row's year table
    ///
    /// Returns the year, or None when the row has no parseable date.
    pub fn record(
        &mut self,
        extractor: &CategoryExtractor,
        row: &Row,
        outcome: &MatchOutcome,
    ) -> Option<i32> {
        let year = row.get(&self.date_field).and_then(parse_year)?;
        let table = self
            .tables
            .entry(year)
            .or_insert_with(|| extractor.new_table());
        outcome.apply(table);
        Some(year)
    }

    /// Table for a single year
    pub fn get(&self, year: i32) -> Option<&TallyTable> {
        self.tables.get(&year)
    }

    /// (year, table) pairs in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &TallyTable)> {
        self.tables.iter().map(|(year, table)| (*year, table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
