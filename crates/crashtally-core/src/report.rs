//! Report documents
//!
//! Shapes a finished [`TallyTable`] into the JSON documents consumed by
//! chart dashboards: the per-code `codes` document and the flat
//! `labels`/`values` chart series.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, TallyTable, Vocabulary};

/// One code with its label and final count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCount {
    pub code: String,
    pub label: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CodeCount {
    /// Pair every vocabulary code with its count, in declaration order
    pub fn from_table(vocabulary: &Vocabulary, table: &TallyTable) -> Vec<Self> {
        vocabulary
            .categories()
            .iter()
            .map(|category| Self {
                code: category.code.clone(),
                label: category.label.clone(),
                count: table.get(&category.code).unwrap_or(0),
                color: category.color.clone(),
            })
            .collect()
    }
}

/// Counts for a single calendar year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCounts {
    pub year: i32,
    pub codes: Vec<CodeCount>,
}

/// Flat chart series: parallel label and value arrays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// Final output of one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyReport {
    /// Vocabulary name
    pub vocabulary: String,

    /// Row field the codes were read from
    pub field: String,

    /// Counts in declaration order
    pub codes: Vec<CodeCount>,

    /// Rows read across all loaded sources
    pub total_records: u64,

    /// Per-year counts, ascending by year (empty unless requested)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<YearCounts>,

    /// Sources that could not be loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_sources: Vec<String>,

    pub generated_at: DateTime<Utc>,
}

impl TallyReport {
    /// Create a report from a finished table
    pub fn new(vocabulary: &Vocabulary, table: &TallyTable, total_records: u64) -> Self {
        Self {
            vocabulary: vocabulary.name().to_string(),
            field: vocabulary.field().to_string(),
            codes: CodeCount::from_table(vocabulary, table),
            total_records,
            years: Vec::new(),
            skipped_sources: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Attach per-year tables
    pub fn with_years<'a>(
        mut self,
        vocabulary: &Vocabulary,
        years: impl IntoIterator<Item = (i32, &'a TallyTable)>,
    ) -> Self {
        self.years = years
            .into_iter()
            .map(|(year, table)| YearCounts {
                year,
                codes: CodeCount::from_table(vocabulary, table),
            })
            .collect();
        self.years.sort_by_key(|y| y.year);
        self
    }

    /// Record sources that were skipped
    pub fn with_skipped_sources(mut self, sources: Vec<String>) -> Self {
        self.skipped_sources = sources;
        self
    }

    /// Reorder codes by descending count, ties keeping declaration order
    pub fn sorted_by_count(mut self) -> Self {
        self.codes.sort_by(|a, b| b.count.cmp(&a.count));
        for year in &mut self.years {
            year.codes.sort_by(|a, b| b.count.cmp(&a.count));
        }
        self
    }

    /// Sum of all code counts
    pub fn total_count(&self) -> u64 {
        self.codes.iter().map(|c| c.count).sum()
    }

    /// Flatten into a labels/values chart series
    pub fn chart_series(&self) -> ChartSeries {
        ChartSeries {
            labels: self.codes.iter().map(|c| c.label.clone()).collect(),
            values: self.codes.iter().map(|c| c.count).collect(),
        }
    }

    /// Write the JSON document to `path`, newline-terminated
    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<()> {
        std::fs::write(path, format!("{}\n", self.to_json(pretty)?))?;
        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl ChartSeries {
    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
