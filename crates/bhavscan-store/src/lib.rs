//! Table persistence for bhavscan.
//!
//! Ledgers and watchlists are plain header + rows tables. This crate owns the
//! read-table / write-table boundary so the core never touches a spreadsheet
//! library directly:
//! - [`Table`] and [`Cell`], the in-memory model
//! - [`TableStore`], read/write by path
//! - [`xlsx::XlsxStore`] and [`csv::CsvStore`] implementations
//! - [`TableFormat`], the selector used by configuration

pub mod csv;
pub mod xlsx;

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub use self::csv::CsvStore;
pub use self::xlsx::XlsxStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] ::csv::Error),

    #[error(transparent)]
    XlsxRead(#[from] calamine::XlsxError),

    #[error(transparent)]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("workbook has no worksheets: {}", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("table too large for a worksheet: {rows} rows x {columns} columns")]
    TooLarge { rows: usize, columns: usize },

    #[error("invalid table format '{value}', expected one of xlsx, csv")]
    InvalidFormat { value: String },
}

/// A single table value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Empty | Self::Number(_) => None,
        }
    }

    /// Numeric view of the cell. Text that parses as a float counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => value.trim().parse::<f64>().ok(),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

/// Header plus rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Appends a row, padding short rows with [`Cell::Empty`] and dropping
    /// cells beyond the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }
}

/// Read-table / write-table by path.
pub trait TableStore {
    fn format(&self) -> TableFormat;

    /// Reads the first sheet (or the whole file) with its first row as header.
    /// A missing file is reported as [`StoreError::NotFound`].
    fn read_table(&self, path: &Path) -> Result<Table, StoreError>;

    /// Writes the table, replacing any existing file and creating parent
    /// directories as needed.
    fn write_table(&self, path: &Path, table: &Table) -> Result<(), StoreError>;
}

/// Supported on-disk table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    pub const ALL: [Self; 2] = [Self::Xlsx, Self::Csv];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub const fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn open_store(self) -> Box<dyn TableStore> {
        match self {
            Self::Xlsx => Box::new(XlsxStore),
            Self::Csv => Box::new(CsvStore),
        }
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self::Xlsx
    }
}

impl Display for TableFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(StoreError::InvalidFormat {
                value: other.to_owned(),
            }),
        }
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
