//! CLI argument definitions for bhavscan.
//!
//! `bhavscan` takes no subcommand: one invocation runs the whole batch
//! against the working root. Every flag has a default, so a bare `bhavscan`
//! in a folder containing `DATA/` is the normal use.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--root` | `$BHAVSCAN_HOME` or `.` | Folder holding `DATA/` and `RESULTS/` |
//! | `--ledger-mode` | `append` | How bucket ledgers are merged |
//! | `--retention` | `grow` | Whether aged bucket copies are removed |
//! | `--table-format` | `xlsx` | File format of ledgers and watchlists |
//! | `--top-n` | `49` | Ranking depth before the stability filter |
//! | `--format` | `table` | Run summary format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! ```bash
//! # Run in the current folder
//! bhavscan
//!
//! # Idempotent ledgers and buckets swept of aged snapshots
//! bhavscan --ledger-mode upsert --retention prune
//!
//! # Machine-readable summary
//! RUST_LOG=warn bhavscan --format json --pretty
//! ```

use std::path::PathBuf;

use bhavscan_core::{LedgerMode, RetentionMode, ScanConfig, DEFAULT_TOP_N};
use bhavscan_store::TableFormat;
use clap::{Parser, ValueEnum};

/// Daily equity snapshot scanner.
///
/// Normalises exchange bhavcopy files, routes them into 5-day, 1-month and
/// 3-month windows, keeps a ledger per window and writes ROC watchlists
/// filtered by closing-price stability.
#[derive(Debug, Parser)]
#[command(name = "bhavscan", author, version, about = "Daily equity snapshot scanner")]
pub struct Cli {
    /// Working root containing DATA/ and RESULTS/.
    ///
    /// Defaults to $BHAVSCAN_HOME when set, otherwise the current directory.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// How new rows are merged into each bucket ledger.
    ///
    /// - append: concatenate; re-runs duplicate rows
    /// - upsert: one row per (symbol, date); re-runs are idempotent
    #[arg(long, value_enum, default_value_t = LedgerModeArg::Append)]
    pub ledger_mode: LedgerModeArg,

    /// Whether bucket folders drop snapshots older than their window.
    #[arg(long, value_enum, default_value_t = RetentionArg::Grow)]
    pub retention: RetentionArg,

    /// File format for ledgers and watchlists.
    #[arg(long, value_enum, default_value_t = TableFormatArg::Xlsx)]
    pub table_format: TableFormatArg,

    /// Number of symbols kept per ranking before the stability filter.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        let mut config = match &self.root {
            Some(root) => ScanConfig::new(root),
            None => ScanConfig::default(),
        };
        config.ledger_mode = self.ledger_mode.into();
        config.retention = self.retention.into();
        config.table_format = self.table_format.into();
        config.top_n = self.top_n;
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedgerModeArg {
    Append,
    Upsert,
}

impl From<LedgerModeArg> for LedgerMode {
    fn from(value: LedgerModeArg) -> Self {
        match value {
            LedgerModeArg::Append => Self::Append,
            LedgerModeArg::Upsert => Self::Upsert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RetentionArg {
    Grow,
    Prune,
}

impl From<RetentionArg> for RetentionMode {
    fn from(value: RetentionArg) -> Self {
        match value {
            RetentionArg::Grow => Self::Grow,
            RetentionArg::Prune => Self::Prune,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormatArg {
    Xlsx,
    Csv,
}

impl From<TableFormatArg> for TableFormat {
    fn from(value: TableFormatArg) -> Self {
        match value {
            TableFormatArg::Xlsx => Self::Xlsx,
            TableFormatArg::Csv => Self::Csv,
        }
    }
}
