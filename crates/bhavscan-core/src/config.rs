use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use bhavscan_store::TableFormat;
use serde::Serialize;

use crate::domain::{RecencyBucket, SortOrder, StabilityCondition};

pub const DATA_DIR: &str = "DATA";
pub const RESULTS_DIR: &str = "RESULTS";
pub const HOME_ENV: &str = "BHAVSCAN_HOME";

pub const DEFAULT_TOP_N: usize = 49;
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// How new rows are merged into an existing bucket ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Concatenate after the existing rows; re-runs duplicate rows.
    #[default]
    Append,
    /// Replace rows with the same (symbol, date), append the rest.
    Upsert,
}

impl LedgerMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Upsert => "upsert",
        }
    }
}

/// Whether bucket folders are swept of files older than their window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionMode {
    /// Membership only grows.
    #[default]
    Grow,
    Prune,
}

impl RetentionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grow => "grow",
            Self::Prune => "prune",
        }
    }
}

/// Directory layout rooted at the working directory.
///
/// ```text
/// <root>/DATA/               raw and canonical snapshots
/// <root>/DATA/<bucket>/      routed copies
/// <root>/<bucket>.<ext>      ledgers
/// <root>/RESULTS/<ORDER>/    watchlists
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn bucket_dir(&self, bucket: RecencyBucket) -> PathBuf {
        self.data_dir().join(bucket.as_str())
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    pub fn sort_order_dir(&self, order: SortOrder) -> PathBuf {
        self.results_dir().join(order.as_str())
    }

    pub fn ledger_path(&self, bucket: RecencyBucket, format: TableFormat) -> PathBuf {
        self.root
            .join(format!("{}.{}", bucket.as_str(), format.extension()))
    }

    pub fn watchlist_path(
        &self,
        bucket: RecencyBucket,
        order: SortOrder,
        condition: StabilityCondition,
        format: TableFormat,
    ) -> PathBuf {
        self.sort_order_dir(order).join(format!(
            "{} ({}).{}",
            bucket.as_str(),
            condition.as_str(),
            format.extension()
        ))
    }

    /// Creates `RESULTS/` and its sort-order folders, returning those that
    /// did not exist before.
    pub fn ensure_results_dirs(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut created = Vec::new();
        let results = self.results_dir();
        if !results.exists() {
            fs::create_dir_all(&results)?;
            created.push(results);
        }
        for order in SortOrder::ALL {
            let dir = self.sort_order_dir(order);
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
                created.push(dir);
            }
        }
        Ok(created)
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub layout: DataLayout,
    pub ledger_mode: LedgerMode,
    pub retention: RetentionMode,
    pub table_format: TableFormat,
    pub top_n: usize,
    pub tolerance: f64,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: DataLayout::new(root),
            ledger_mode: LedgerMode::default(),
            retention: RetentionMode::default(),
            table_format: TableFormat::default(),
            top_n: DEFAULT_TOP_N,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(resolve_root())
    }
}

/// `BHAVSCAN_HOME` when set and non-empty, else the current directory.
pub fn resolve_root() -> PathBuf {
    if let Some(path) = env::var_os(HOME_ENV) {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    PathBuf::from(".")
}
