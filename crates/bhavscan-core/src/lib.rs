//! Core pipeline for bhavscan.
//!
//! This crate contains:
//! - Snapshot domain types, file naming and recency buckets
//! - Raw exchange file ingestion into canonical snapshots
//! - Retention routing into `5 DAYS` / `1 MONTH` / `3 MONTHS`
//! - Per-bucket ledgers with append or upsert merging
//! - ROC ranking with the closing-price stability filter
//! - The batch [`Pipeline`] tying the stages together

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod router;
pub mod snapshot_io;
pub mod watchlist;

pub use aggregate::{AggregateReport, AggregationService, Ledger, LedgerRow, LEDGER_COLUMNS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    resolve_root, DataLayout, LedgerMode, RetentionMode, ScanConfig, DEFAULT_TOLERANCE,
    DEFAULT_TOP_N, HOME_ENV,
};
pub use domain::{RecencyBucket, Snapshot, SnapshotRow, SortOrder, StabilityCondition};
pub use error::{FileFailure, ScanError};
pub use ingest::{IngestReport, SnapshotIngestor};
pub use pipeline::{BucketOutcome, Pipeline, RunReport};
pub use router::{RetentionRouter, RouteReport};
pub use snapshot_io::{list_canonical_files, list_raw_files, read_snapshot, write_snapshot};
pub use watchlist::{
    compute_roc, rate_of_change, within_band, ReferenceCloses, ReferenceWindow, Watchlist,
    WatchlistEngine, WatchlistEntry, WatchlistReport, WATCHLIST_COLUMNS,
};
