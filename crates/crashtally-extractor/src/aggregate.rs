//! Multi-source aggregation
//!
//! Runs one extractor over several sources in order, accumulating into a
//! single table. A source that fails to load is recorded and skipped; the
//! run always completes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crashtally_core::{Row, TallyReport, TallyTable};
use crashtally_parser::ParserRegistry;

use crate::category::{CategoryExtractor, MatchOutcome};
use crate::yearly::YearlyTally;

// ============================================================================
// Run bookkeeping
// ============================================================================

/// Row-level counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Rows read from loaded sources
    pub rows_read: u64,
    /// Rows with a non-empty target value
    pub rows_with_value: u64,
    /// Rows resolved by exact match
    pub exact_matches: u64,
    /// Rows resolved by substring match
    pub substring_matches: u64,
    /// Rows counted into the fallback code
    pub fallback_matches: u64,
    /// Rows with a value that matched nothing
    pub rows_unmatched: u64,
    /// Total table increments
    pub increments: u64,
    /// Rows without a parseable year (yearly runs only)
    pub undated: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &MatchOutcome) {
        self.rows_read += 1;
        self.increments += outcome.increments() as u64;
        match outcome {
            MatchOutcome::Skipped => return,
            MatchOutcome::Exact(_) => self.exact_matches += 1,
            MatchOutcome::Substring(_) => self.substring_matches += 1,
            MatchOutcome::Fallback(_) => self.fallback_matches += 1,
            MatchOutcome::Unmatched => self.rows_unmatched += 1,
        }
        self.rows_with_value += 1;
    }

    /// Rows that incremented at least one code
    pub fn rows_matched(&self) -> u64 {
        self.exact_matches + self.substring_matches + self.fallback_matches
    }
}

/// What happened to one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { rows: u64 },
    Failed { error: String },
}

/// Outcome for one source, in processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceSummary {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, SourceStatus::Loaded { .. })
    }
}

// ============================================================================
// Extraction run
// ============================================================================

/// Accumulates one vocabulary's counts across sources
pub struct ExtractionRun<'a> {
    extractor: &'a CategoryExtractor,
    table: TallyTable,
    yearly: Option<YearlyTally>,
    stats: RunStats,
    sources: Vec<SourceSummary>,
}

impl<'a> ExtractionRun<'a> {
    /// Start a run with a fresh zeroed table
    pub fn new(extractor: &'a CategoryExtractor) -> Self {
        Self {
            extractor,
            table: extractor.new_table(),
            yearly: None,
            stats: RunStats::default(),
            sources: Vec::new(),
        }
    }

    /// Also break counts down by the year in `date_field`
    pub fn with_years(mut self, date_field: impl Into<String>) -> Self {
        self.yearly = Some(YearlyTally::new(date_field));
        self
    }

    /// Tally rows directly, outside any named source
    pub fn add_rows<'r>(&mut self, rows: impl IntoIterator<Item = &'r Row>) -> u64 {
        let mut count = 0;
        for row in rows {
            let outcome = self.extractor.tally_row(row, &mut self.table);
            self.stats.record(&outcome);

            if let Some(yearly) = &mut self.yearly {
                if yearly.record(self.extractor, row, &outcome).is_none() {
                    self.stats.undated += 1;
                }
            }
            count += 1;
        }
        count
    }

    /// Tally an already loaded source, or record its load failure
    pub fn add_source<E: std::fmt::Display>(
        &mut self,
        name: impl Into<String>,
        loaded: std::result::Result<Vec<Row>, E>,
    ) {
        let name = name.into();
        let status = match loaded {
            Ok(rows) => {
                let rows = self.add_rows(&rows);
                info!(source = %name, rows, "Processed source");
                SourceStatus::Loaded { rows }
            }
            Err(e) => {
                warn!(source = %name, error = %e, "Skipping source");
                SourceStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.sources.push(SourceSummary { name, status });
    }

    /// Load a file through the parser registry and tally it
    pub fn add_path(&mut self, registry: &ParserRegistry, path: &Path) {
        let loaded = registry.parse(path).map(|table| table.rows);
        self.add_source(path.display().to_string(), loaded);
    }

    /// Load and tally several files in order
    pub fn add_paths<P: AsRef<Path>>(
        &mut self,
        registry: &ParserRegistry,
        paths: impl IntoIterator<Item = P>,
    ) {
        for path in paths {
            self.add_path(registry, path.as_ref());
        }
    }

    /// Current counts
    pub fn table(&self) -> &TallyTable {
        &self.table
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    /// Finish the run and hand off the results
    pub fn finish(self) -> ExtractionOutput {
        let vocabulary = self.extractor.vocabulary();
        let loaded = self.sources.iter().filter(|s| s.is_loaded()).count();
        debug!(
            vocabulary = vocabulary.name(),
            sources = self.sources.len(),
            loaded,
            rows_read = self.stats.rows_read,
            rows_matched = self.stats.rows_matched(),
            rows_unmatched = self.stats.rows_unmatched,
            increments = self.stats.increments,
            "Extraction run finished"
        );
        if !self.sources.is_empty() && loaded == 0 {
            warn!(
                vocabulary = vocabulary.name(),
                "No source could be loaded; all counts are zero"
            );
        }

        let mut report = TallyReport::new(vocabulary, &self.table, self.stats.rows_read)
            .with_skipped_sources(
                self.sources
                    .iter()
                    .filter(|s| !s.is_loaded())
                    .map(|s| s.name.clone())
                    .collect(),
            );
        if let Some(yearly) = &self.yearly {
            report = report.with_years(vocabulary, yearly.iter());
        }

        ExtractionOutput {
            table: self.table,
            yearly: self.yearly,
            stats: self.stats,
            sources: self.sources,
            report,
        }
    }
}

/// Results of a finished run
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub table: TallyTable,
    pub yearly: Option<YearlyTally>,
    pub stats: RunStats,
    pub sources: Vec<SourceSummary>,
    pub report: TallyReport,
}

impl ExtractionOutput {
    /// True when every attempted source failed to load
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.is_loaded())
    }
}

// ============================================================================
// Tests
// ============================================================================
