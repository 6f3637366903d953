use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while scanning snapshots, routing, aggregating or ranking.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot parse date from file name '{file}': {reason}")]
    FilenameParse { file: String, reason: String },

    #[error("{file}: required columns missing: {}", missing.join(", "))]
    Schema { file: String, missing: Vec<String> },

    #[error("{file}: line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        file: String,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("not enough files in {folder} for {purpose}: need {required}, found {found}")]
    InsufficientData {
        folder: String,
        purpose: &'static str,
        required: usize,
        found: usize,
    },

    #[error("{} does not exist", path.display())]
    MissingLedger { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] bhavscan_store::StoreError),
}

impl ScanError {
    /// Stable machine-readable code used in run reports.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FilenameParse { .. } => "filename_parse",
            Self::Schema { .. } => "schema",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::MissingLedger { .. } => "missing_ledger",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Store(_) => "store",
        }
    }
}

/// A per-file error that was logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub code: &'static str,
    pub message: String,
}

impl FileFailure {
    pub fn new(file: impl Into<String>, error: &ScanError) -> Self {
        Self {
            file: file.into(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}
