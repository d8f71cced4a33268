//! Spreadsheet decoding into a plain cell grid.
//!
//! The extractor never sees calamine types. A workbook is read once, its first
//! sheet is copied into a [`TabularGrid`] at absolute coordinates (row 0,
//! column 0 is cell A1) and the workbook is dropped.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::vocabulary::normalize;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,
}

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Int(value) => Self::Number(*value as f64),
            Data::Float(value) => Self::Number(*value),
            Data::String(value) if value.trim().is_empty() => Self::Empty,
            Data::String(value) => Self::Text(value.to_owned()),
            Data::Bool(value) => Self::Text(value.to_string()),
            Data::DateTime(value) => Self::Number(value.as_f64()),
            Data::DateTimeIso(value) | Data::DurationIso(value) => Self::Text(value.to_owned()),
            Data::Error(_) | Data::Empty => Self::Empty,
        }
    }

    /// Numeric reading of the cell. Only cells the workbook stores as numbers
    /// qualify; text such as `"1.200"` is locale dependent and never parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(value) => value.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// Rows of cells, 0-indexed. Rows can be ragged; anything past the end of a
/// row reads as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularGrid {
    rows: Vec<Vec<CellValue>>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl TabularGrid {
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Cell text upper-cased, trimmed and without accents.
    pub fn text(&self, row: usize, column: usize) -> String {
        normalize(&self.cell(row, column).as_text())
    }

    pub fn number(&self, row: usize, column: usize) -> Option<f64> {
        self.cell(row, column).as_number()
    }
}

/// First sheet of a workbook.
#[derive(Debug, Clone)]
pub struct DecodedSheet {
    pub sheet_name: String,
    pub grid: TabularGrid,
}

/// Decodes an in-memory workbook (xlsx, xlsm, xlsb, xls or ods).
pub fn decode_workbook(bytes: Vec<u8>) -> Result<DecodedSheet, GridError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(GridError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    if let Some((row_offset, column_offset)) = range.start() {
        let row_offset = row_offset as usize;
        let column_offset = column_offset as usize;
        rows.resize(row_offset, Vec::new());

        for source_row in range.rows() {
            let mut cells = vec![CellValue::Empty; column_offset];
            cells.extend(source_row.iter().map(CellValue::from_data));
            rows.push(cells);
        }
    }

    tracing::debug!(sheet = %sheet_name, rows = rows.len(), "decoded first sheet");

    Ok(DecodedSheet {
        sheet_name,
        grid: TabularGrid::from_rows(rows),
    })
}

/// Reads a workbook file into memory. Decoding is left to
/// [`decode_workbook`] so that it can run off the async runtime.
pub async fn read_workbook_bytes(path: &Path) -> Result<Vec<u8>, GridError> {
    tokio::fs::read(path).await.map_err(|source| GridError::Io {
        path: path.display().to_string(),
        source,
    })
}
