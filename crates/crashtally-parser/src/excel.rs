//! Excel workbook parser using calamine
//!
//! Loads rows from Excel files (XLSX, XLS). Each sheet's first row is its
//! header; rows from all selected sheets are concatenated. A selected sheet
//! that cannot be read fails the whole workbook.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::{build_row, FileType, ParsedTable, ParserError, Result, TableParser};

/// Excel workbook parser
pub struct ExcelParser {
    /// Sheets to read (None = all sheets)
    pub sheet_filter: Option<Vec<String>>,
}

impl ExcelParser {
    /// Create a new Excel parser reading every sheet
    pub fn new() -> Self {
        Self { sheet_filter: None }
    }

    /// Filter specific sheets
    pub fn with_sheets(mut self, sheets: Vec<String>) -> Self {
        self.sheet_filter = Some(sheets);
        self
    }

    /// Convert a Data cell to string
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => {
                // Format without unnecessary decimals
                if f.fract() == 0.0 {
                    format!("{}", *f as i64)
                } else {
                    format!("{f}")
                }
            }
            Data::Int(i) => format!("{i}"),
            Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Data::Error(e) => format!("#ERROR: {e:?}"),
            Data::DateTime(dt) => format!("{dt}"),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
        }
    }

    fn wants_sheet(&self, name: &str) -> bool {
        match &self.sheet_filter {
            Some(filter) => filter.iter().any(|s| s == name),
            None => true,
        }
    }

    /// Convert one sheet into rows, skipping fully empty lines
    fn sheet_rows(range: &calamine::Range<Data>) -> (Vec<String>, Vec<crashtally_core::Row>) {
        let mut rows_iter = range.rows();

        let headers: Vec<String> = rows_iter
            .next()
            .map(|first| {
                first
                    .iter()
                    .map(|c| Self::cell_to_string(c).trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows_iter
            .map(|row| row.iter().map(Self::cell_to_string).collect::<Vec<_>>())
            .filter(|cells| !cells.iter().all(|s| s.is_empty()))
            .map(|cells| build_row(&headers, cells.iter().map(String::as_str)))
            .collect();

        (headers, rows)
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TableParser for ExcelParser {
    fn parse(&self, path: &Path) -> Result<ParsedTable> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ParserError::ExcelError(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut table = ParsedTable::new(path.display().to_string(), FileType::from_path(path));

        for sheet_name in sheet_names.iter().filter(|s| self.wants_sheet(s)) {
            let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                ParserError::ExcelError(format!(
                    "{}: sheet '{}': {}",
                    table.file_path, sheet_name, e
                ))
            })?;

            let (headers, rows) = Self::sheet_rows(&range);
            if headers.iter().all(|h| h.is_empty()) {
                continue;
            }

            for header in headers {
                if !header.is_empty() && !table.has_column(&header) {
                    table.headers.push(header);
                }
            }
            table.rows.extend(rows);
        }

        if table.headers.is_empty() {
            return Err(ParserError::MissingHeader(table.file_path));
        }

        Ok(table)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Xlsx, FileType::Xls]
    }
}
