//! Delimited text parser using the csv crate
//!
//! Reads header-first CSV/TSV exports into rows. Quoted fields may carry
//! several comma-joined condition codes; they are kept verbatim.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::{build_row, FileType, ParsedTable, ParserError, Result, TableParser};

/// Delimited text parser
pub struct DelimitedParser {
    /// Field delimiter
    pub delimiter: u8,
    /// File types this instance handles
    file_types: &'static [FileType],
}

impl DelimitedParser {
    /// Comma-separated parser
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            file_types: &[FileType::Csv],
        }
    }

    /// Tab-separated parser
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            file_types: &[FileType::Tsv],
        }
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse from any reader; `name` is used for the table path and errors
    pub fn parse_reader<R: Read>(&self, reader: R, name: &str) -> Result<ParsedTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let csv_error = |e: csv::Error| ParserError::CsvError {
            path: name.to_string(),
            message: e.to_string(),
        };

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ParserError::MissingHeader(name.to_string()));
        }

        let mut table = ParsedTable::new(name, self.file_types[0]);
        for record in rdr.records() {
            let record = record.map_err(csv_error)?;
            table.rows.push(build_row(&headers, record.iter()));
        }
        table.headers = headers;

        Ok(table)
    }
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TableParser for DelimitedParser {
    fn parse(&self, path: &Path) -> Result<ParsedTable> {
        let file = std::fs::File::open(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let name = path.display().to_string();
        let mut table = self.parse_reader(std::io::BufReader::new(file), &name)?;
        table.file_type = FileType::from_path(path);
        Ok(table)
    }

    fn supported_types(&self) -> &[FileType] {
        self.file_types
    }
}
