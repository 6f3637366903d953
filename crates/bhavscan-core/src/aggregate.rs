//! Per-bucket ledger aggregation.

use std::collections::HashMap;
use std::path::PathBuf;

use bhavscan_store::{Cell, StoreError, Table, TableStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{DataLayout, LedgerMode};
use crate::domain::{RecencyBucket, SnapshotRow};
use crate::error::FileFailure;
use crate::snapshot_io::{display_name, list_canonical_files, read_snapshot};
use crate::ScanError;

pub const LEDGER_COLUMNS: [&str; 5] = ["Symbol", "Series", "Close", "Volume", "Date"];

/// Projected snapshot row kept in a bucket ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub symbol: String,
    pub series: String,
    pub close: f64,
    pub volume: u64,
    pub date: String,
}

impl LedgerRow {
    pub fn key(&self) -> (&str, &str) {
        (self.symbol.as_str(), self.date.as_str())
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.symbol.as_str()),
            Cell::from(self.series.as_str()),
            Cell::from(self.close),
            Cell::from(self.volume),
            Cell::from(self.date.as_str()),
        ]
    }
}

impl From<&SnapshotRow> for LedgerRow {
    fn from(row: &SnapshotRow) -> Self {
        Self {
            symbol: row.symbol.clone(),
            series: row.series.clone(),
            close: row.close,
            volume: row.volume,
            date: row.date.clone(),
        }
    }
}

/// Ordered ledger rows plus the merge policy applied to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Merges `incoming` after the current rows.
    ///
    /// `Append` concatenates. `Upsert` keeps one row per (symbol, date): an
    /// incoming row replaces an existing one in place, and duplicates already
    /// present collapse to their last occurrence.
    pub fn merge(&mut self, incoming: Vec<LedgerRow>, mode: LedgerMode) {
        match mode {
            LedgerMode::Append => self.rows.extend(incoming),
            LedgerMode::Upsert => {
                let existing = std::mem::take(&mut self.rows);
                let mut positions: HashMap<(String, String), usize> = HashMap::new();
                for row in existing.into_iter().chain(incoming) {
                    let key = (row.symbol.clone(), row.date.clone());
                    match positions.get(&key).copied() {
                        Some(position) => self.rows[position] = row,
                        None => {
                            positions.insert(key, self.rows.len());
                            self.rows.push(row);
                        }
                    }
                }
            }
        }
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(LEDGER_COLUMNS);
        for row in &self.rows {
            table.push_row(row.to_cells());
        }
        table
    }

    /// Parses a stored ledger. Rows with an empty symbol or a non-numeric
    /// close/volume are dropped and counted.
    pub fn from_table(file: &str, table: &Table) -> Result<(Self, usize), ScanError> {
        let mut index = [0usize; 5];
        let mut missing = Vec::new();
        for (slot, name) in LEDGER_COLUMNS.iter().enumerate() {
            match table.column_index(name) {
                Some(position) => index[slot] = position,
                None => missing.push((*name).to_owned()),
            }
        }
        if !missing.is_empty() {
            return Err(ScanError::Schema {
                file: file.to_owned(),
                missing,
            });
        }

        let mut ledger = Self::default();
        let mut dropped = 0;
        for cells in table.rows() {
            let symbol = cells[index[0]].to_string();
            let close = cells[index[2]].as_number();
            let volume = cells[index[3]]
                .as_number()
                .filter(|volume| *volume >= 0.0 && volume.fract() == 0.0);

            match (symbol.is_empty(), close, volume) {
                (false, Some(close), Some(volume)) => ledger.rows.push(LedgerRow {
                    symbol,
                    series: cells[index[1]].to_string(),
                    close,
                    volume: volume as u64,
                    date: cells[index[4]].to_string(),
                }),
                _ => dropped += 1,
            }
        }

        Ok((ledger, dropped))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub bucket: RecencyBucket,
    pub ledger_path: Option<PathBuf>,
    pub files_read: usize,
    pub rows_added: usize,
    pub ledger_rows: usize,
    pub created: bool,
    pub failures: Vec<FileFailure>,
}

/// Builds the `<bucket>` ledger from every canonical file in the bucket.
pub struct AggregationService<'a> {
    layout: &'a DataLayout,
    store: &'a dyn TableStore,
    mode: LedgerMode,
}

impl<'a> AggregationService<'a> {
    pub fn new(layout: &'a DataLayout, store: &'a dyn TableStore, mode: LedgerMode) -> Self {
        Self {
            layout,
            store,
            mode,
        }
    }

    /// Reads the bucket's snapshots in file-name order, keeps `EQ`/`BE` rows
    /// and merges them into the ledger.
    ///
    /// Files with missing columns or bad values are logged and skipped. When
    /// no file could be read the ledger is left untouched.
    pub fn aggregate_bucket(&self, bucket: RecencyBucket) -> Result<AggregateReport, ScanError> {
        let folder = self.layout.bucket_dir(bucket);
        let mut report = AggregateReport {
            bucket,
            ledger_path: None,
            files_read: 0,
            rows_added: 0,
            ledger_rows: 0,
            created: false,
            failures: Vec::new(),
        };

        let files = list_canonical_files(&folder)?;
        if files.is_empty() {
            info!("No converted CSV files found in {}", folder.display());
            return Ok(report);
        }

        let mut incoming = Vec::new();
        for path in &files {
            let file = display_name(path);
            match read_snapshot(path) {
                Ok(snapshot) => {
                    report.files_read += 1;
                    incoming.extend(
                        snapshot
                            .rows
                            .iter()
                            .filter(|row| row.is_ranked())
                            .map(LedgerRow::from),
                    );
                }
                Err(error) => {
                    warn!("Skipping {file}: {error}");
                    report.failures.push(FileFailure::new(file, &error));
                }
            }
        }

        if report.files_read == 0 {
            return Ok(report);
        }

        let ledger_path = self.layout.ledger_path(bucket, self.store.format());
        let ledger_file = display_name(&ledger_path);
        let mut ledger = match self.store.read_table(&ledger_path) {
            Ok(table) => {
                let (ledger, dropped) = Ledger::from_table(&ledger_file, &table)?;
                if dropped > 0 {
                    warn!("{ledger_file}: dropped {dropped} unreadable ledger rows");
                }
                ledger
            }
            Err(StoreError::NotFound { path }) => {
                let missing = ScanError::MissingLedger { path };
                info!("{missing}. Creating a new file.");
                report.created = true;
                Ledger::default()
            }
            Err(error) => return Err(error.into()),
        };

        report.rows_added = incoming.len();
        ledger.merge(incoming, self.mode);
        self.store.write_table(&ledger_path, &ledger.to_table())?;
        info!(
            "Saved {} rows to {} ({} mode)",
            ledger.len(),
            ledger_path.display(),
            self.mode.as_str()
        );

        report.ledger_rows = ledger.len();
        report.ledger_path = Some(ledger_path);
        Ok(report)
    }
}
