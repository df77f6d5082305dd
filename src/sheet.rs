// src/sheet.rs

//! Spreadsheet containers. Everything downstream works on a plain string
//! matrix, so a reader only has to turn bytes into named sheets of strings.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::{io::Cursor, path::Path};
use tracing::{debug, instrument};

/// Row-major cell text, `""` for blank cells.
pub type RawMatrix = Vec<Vec<String>>;

/// Decoded sheets in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<(String, RawMatrix)>,
}

impl Workbook {
    pub fn push_sheet(&mut self, name: impl Into<String>, rows: RawMatrix) {
        self.sheets.push((name.into(), rows));
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn sheet_at(&self, name: &str) -> Option<&RawMatrix> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows)
    }

    /// The sheet every import reads.
    pub fn first_sheet(&self) -> Option<(&str, &RawMatrix)> {
        self.sheets
            .first()
            .map(|(name, rows)| (name.as_str(), rows))
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Turns raw file bytes into a [`Workbook`].
pub trait SpreadsheetReader: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Workbook>;
}

/// xls / xlsx / xlsm / ods through calamine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl SpreadsheetReader for CalamineReader {
    #[instrument(level = "debug", skip(self, bytes), fields(len = bytes.len()))]
    fn decode(&self, bytes: &[u8]) -> Result<Workbook> {
        let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .context("opening workbook")?;

        let mut workbook = Workbook::default();
        for name in sheets.sheet_names() {
            let range = sheets
                .worksheet_range(&name)
                .with_context(|| format!("reading sheet `{}`", name))?;

            // calamine ranges start at the first used cell; pad back to A1
            let (row_offset, col_offset) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));
            let mut rows: RawMatrix = vec![Vec::new(); row_offset];
            for row in range.rows() {
                let mut cells = vec![String::new(); col_offset];
                cells.extend(row.iter().map(cell_to_string));
                rows.push(cells);
            }
            debug!(sheet = %name, rows = rows.len(), "decoded sheet");
            workbook.push_sheet(name, rows);
        }
        Ok(workbook)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// A CSV export read as one sheet. Rows may have differing lengths.
#[derive(Debug, Clone)]
pub struct CsvReader {
    sheet_name: String,
}

impl CsvReader {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

impl SpreadsheetReader for CsvReader {
    #[instrument(level = "debug", skip(self, bytes), fields(sheet = %self.sheet_name))]
    fn decode(&self, bytes: &[u8]) -> Result<Workbook> {
        let text = std::str::from_utf8(bytes).context("CSV is not UTF-8")?;
        let text = text.trim_start_matches('\u{feff}');
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = RawMatrix::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("parsing CSV record {}", idx + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        debug!(rows = rows.len(), "decoded csv");

        let mut workbook = Workbook::default();
        workbook.push_sheet(self.sheet_name.clone(), rows);
        Ok(workbook)
    }
}

/// Pick a reader from the file extension. Anything that is not CSV goes to
/// calamine, which sniffs the actual container format.
pub fn reader_for_path(path: &Path) -> Box<dyn SpreadsheetReader> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Sheet1".to_string());
            Box::new(CsvReader::new(stem))
        }
        _ => Box::new(CalamineReader),
    }
}
