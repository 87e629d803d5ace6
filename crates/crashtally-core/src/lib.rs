//! crashtally Core - Domain models and shared types
//!
//! This crate defines the core abstractions used throughout crashtally:
//! - Category codes, labels and vocabularies
//! - Rows as supplied by the parsing layer
//! - The tally table accumulated during an extraction run
//! - Report documents handed to chart consumers
//! - Common error types
//! - Configuration management

pub mod config;
pub mod report;

pub use config::{
    AppConfig, ConfigError, InputConfig, LoggingConfig, OutputConfig, VocabularyConfig,
};
pub use report::{ChartSeries, CodeCount, TallyReport, YearCounts};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for crashtally operations
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Invalid vocabulary {name}: {reason}")]
    InvalidVocabulary { name: String, reason: String },

    #[error("Unknown vocabulary: {0}")]
    UnknownVocabulary(String),

    #[error("Tally tables have different code sets")]
    IncompatibleTables,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, TallyError>;

// ============================================================================
// Rows
// ============================================================================

/// A single tabular record: column name to raw string value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field value, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<HashMap<String, String>> for Row {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Categories and Vocabularies
// ============================================================================

/// One classification bucket: a fixed code with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Code as it appears in the source data (e.g., "weather_a_1")
    pub code: String,

    /// Human-readable label
    pub label: String,

    /// Optional display color for chart consumers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    /// Create a new category
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            color: None,
        }
    }

    /// Set display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A closed, ordered set of categories read from one row field
///
/// The code set is fixed once built. Declaration order is the order
/// used for every report produced from this vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    name: String,
    field: String,
    categories: Vec<Category>,
    fallback: Option<usize>,
}

impl Vocabulary {
    /// Start building a vocabulary
    pub fn builder(name: impl Into<String>) -> VocabularyBuilder {
        VocabularyBuilder::new(name)
    }

    /// Vocabulary name (e.g., "weather")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row field the codes are read from
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Codes in declaration order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.code.as_str())
    }

    /// Index of a code in declaration order
    pub fn position(&self, code: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.code == code)
    }

    /// Look up a category by code
    pub fn category(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    /// Index of the catch-all code used for unmatched values, if enabled
    pub fn fallback_index(&self) -> Option<usize> {
        self.fallback
    }

    /// The catch-all code, if enabled
    pub fn fallback_code(&self) -> Option<&str> {
        self.fallback.map(|i| self.categories[i].code.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Create a zeroed tally table for this vocabulary's codes
    pub fn new_table(&self) -> TallyTable {
        TallyTable::new(self.codes())
    }
}

/// Builder for [`Vocabulary`]
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    name: String,
    field: Option<String>,
    categories: Vec<Category>,
    fallback: Option<String>,
}

impl VocabularyBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            categories: Vec::new(),
            fallback: None,
        }
    }

    /// Set the row field to read
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Declare a category
    pub fn category(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.categories.push(Category::new(code, label));
        self
    }

    /// Declare a category with a display color
    pub fn colored_category(
        mut self,
        code: impl Into<String>,
        label: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.categories.push(Category::new(code, label).with_color(color));
        self
    }

    /// Declare several prebuilt categories
    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    /// Count values matching no code into `code` instead of dropping them
    pub fn fallback(mut self, code: impl Into<String>) -> Self {
        self.fallback = Some(code.into());
        self
    }

    /// Validate and build the vocabulary
    pub fn build(self) -> Result<Vocabulary> {
        let invalid = |reason: String| TallyError::InvalidVocabulary {
            name: self.name.clone(),
            reason,
        };

        let field = match &self.field {
            Some(f) if !f.trim().is_empty() => f.clone(),
            _ => return Err(invalid("no field name".to_string())),
        };

        if self.categories.is_empty() {
            return Err(invalid("no categories declared".to_string()));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.code.is_empty() {
                return Err(invalid("empty category code".to_string()));
            }
            if !seen.insert(category.code.as_str()) {
                return Err(invalid(format!("duplicate code {}", category.code)));
            }
        }

        let fallback = match &self.fallback {
            Some(code) => Some(
                self.categories
                    .iter()
                    .position(|c| &c.code == code)
                    .ok_or_else(|| invalid(format!("fallback code {code} is not declared")))?,
            ),
            None => None,
        };

        Ok(Vocabulary {
            name: self.name,
            field,
            categories: self.categories,
            fallback,
        })
    }
}

// ============================================================================
// Tally Table
// ============================================================================

/// Per-code occurrence counts, in code declaration order
///
/// Every known code starts at zero. Counts only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyTable {
    entries: Vec<(String, u64)>,
}

impl TallyTable {
    /// Create a zeroed table for the given codes
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: codes.into_iter().map(|c| (c.into(), 0)).collect(),
        }
    }

    /// Increment a code by declaration index
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn increment_at(&mut self, index: usize) {
        self.entries[index].1 += 1;
    }

    /// Increment a code by name; returns false for unknown codes
    pub fn increment(&mut self, code: &str) -> bool {
        match self.entries.iter_mut().find(|(c, _)| c == code) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    /// Count for a code (None if the code is unknown)
    pub fn get(&self, code: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, n)| *n)
    }

    /// Count by declaration index
    pub fn count_at(&self, index: usize) -> u64 {
        self.entries.get(index).map(|(_, n)| *n).unwrap_or(0)
    }

    /// Iterate (code, count) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(c, n)| (c.as_str(), *n))
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// True when every count is zero
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, n)| *n == 0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add another table's counts into this one
    ///
    /// Both tables must have been created from the same codes in the same order.
    pub fn merge(&mut self, other: &TallyTable) -> Result<()> {
        let compatible = self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((a, _), (b, _))| a == b);
        if !compatible {
            return Err(TallyError::IncompatibleTables);
        }

        for ((_, mine), (_, theirs)) in self.entries.iter_mut().zip(&other.entries) {
            *mine += theirs;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
