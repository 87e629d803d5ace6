//! crashtally Parser - Tabular file loading
//!
//! Supports loading of:
//! - Delimited text (CSV, TSV)
//! - Microsoft Excel (XLSX, XLS)
//!
//! Each parser implements the `TableParser` trait and produces a
//! `ParsedTable` whose rows map column names to raw string values,
//! ready for category extraction.

use std::path::Path;

use crashtally_core::Row;
use thiserror::Error;

pub mod delimited;
pub mod excel;

pub use delimited::DelimitedParser;
pub use excel::ExcelParser;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading a tabular file
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Delimited text could not be parsed
    #[error("CSV parsing error in {path}: {message}")]
    CsvError { path: String, message: String },

    /// Excel parsing error
    #[error("Excel parsing error: {0}")]
    ExcelError(String),

    /// File has no header row
    #[error("No header row found: {0}")]
    MissingHeader(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parsed Table Types
// ============================================================================

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Tsv,
    Xlsx,
    Xls,
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "csv" => Self::Csv,
            "tsv" | "tab" => Self::Tsv,
            "xlsx" => Self::Xlsx,
            "xls" => Self::Xls,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Tsv => write!(f, "tsv"),
            Self::Xlsx => write!(f, "xlsx"),
            Self::Xls => write!(f, "xls"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A loaded table: header names plus one [`Row`] per data line
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Source file path
    pub file_path: String,

    /// Detected file type
    pub file_type: FileType,

    /// Column headers in file order
    pub headers: Vec<String>,

    /// Data rows
    pub rows: Vec<Row>,
}

impl ParsedTable {
    /// Create an empty table
    pub fn new(file_path: impl Into<String>, file_type: FileType) -> Self {
        Self {
            file_path: file_path.into(),
            file_type,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of data rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Zip a header row with one record's values
///
/// Short records leave trailing columns absent; extra values are dropped.
/// When a header name repeats, the first column wins.
pub(crate) fn build_row<'a>(
    headers: &[String],
    values: impl IntoIterator<Item = &'a str>,
) -> Row {
    let mut row = Row::new();
    for (header, value) in headers.iter().zip(values) {
        if row.get(header).is_none() {
            row.insert(header.as_str(), value);
        }
    }
    row
}

// ============================================================================
// Parser Trait
// ============================================================================

/// Trait for tabular file parsers
pub trait TableParser: Send + Sync {
    /// Load a table from a file path
    fn parse(&self, path: &Path) -> Result<ParsedTable>;

    /// Get supported file types
    fn supported_types(&self) -> &[FileType];

    /// Check if this parser can handle a file type
    fn can_parse(&self, file_type: FileType) -> bool {
        self.supported_types().contains(&file_type)
    }
}

// ============================================================================
// Parser Registry
// ============================================================================

/// Registry of available parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn TableParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the CSV, TSV and Excel parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DelimitedParser::new());
        registry.register(DelimitedParser::tsv());
        registry.register(ExcelParser::new());
        registry
    }

    /// Register a parser
    pub fn register<P: TableParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find a parser for a file type
    pub fn find_parser(&self, file_type: FileType) -> Option<&dyn TableParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(file_type))
            .map(|p| p.as_ref())
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path) -> Result<ParsedTable> {
        let file_type = FileType::from_path(path);

        if file_type == FileType::Unknown {
            return Err(ParserError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            ));
        }

        let parser = self
            .find_parser(file_type)
            .ok_or_else(|| ParserError::UnsupportedFormat(file_type.to_string()))?;

        parser.parse(path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================
