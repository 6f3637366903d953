use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Canonical snapshot header, in file order.
pub const CANONICAL_COLUMNS: [&str; 9] = [
    "Symbol", "Date", "Open", "High", "Low", "Close", "Volume", "Name", "Series",
];

/// Series tags that take part in ledgers and rankings.
pub const RANKED_SERIES: [&str; 2] = ["EQ", "BE"];

pub fn is_ranked_series(series: &str) -> bool {
    RANKED_SERIES.contains(&series)
}

/// One (symbol, date) row of a daily market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub symbol: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub name: String,
    pub series: String,
}

impl SnapshotRow {
    pub fn is_ranked(&self) -> bool {
        is_ranked_series(&self.series)
    }
}

/// Parsed contents of one canonical snapshot file.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn new(path: impl AsRef<Path>, rows: Vec<SnapshotRow>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Close per symbol. If a symbol repeats, the first row wins.
    pub fn closes(&self) -> HashMap<&str, f64> {
        let mut closes = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            closes.entry(row.symbol.as_str()).or_insert(row.close);
        }
        closes
    }
}
