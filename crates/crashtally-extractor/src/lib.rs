//! crashtally Extractor - Category tally pipeline
//!
//! Turns tabular rows into per-code occurrence counts for a fixed
//! vocabulary of condition codes, across one or many sources.

pub mod aggregate;
pub mod category;
pub mod vocabularies;
pub mod yearly;

pub use aggregate::{ExtractionOutput, ExtractionRun, RunStats, SourceStatus, SourceSummary};
pub use category::{CategoryExtractor, MatchOutcome};
pub use vocabularies::VocabularyRegistry;
pub use yearly::{parse_year, YearlyTally};
