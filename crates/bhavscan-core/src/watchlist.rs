//! ROC ranking with a price-stability filter.
//!
//! For a target bucket the engine compares the first and last snapshot to get
//! a rate of change per symbol, ranks `EQ`/`BE` symbols both ways, keeps the
//! top N of each, then filters them by how close the close price stayed to
//! four reference closes taken from the `1 MONTH` bucket.
//!
//! Reference snapshots are picked by position from the newest `1 MONTH` file
//! (2nd, 3rd, 4th and 5th most recent), not by calendar date. Gaps in the
//! daily files shift which dates are compared.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bhavscan_store::{Cell, Table, TableStore};
use serde::Serialize;
use tracing::info;

use crate::config::DataLayout;
use crate::domain::{RecencyBucket, Snapshot, SortOrder, StabilityCondition};
use crate::snapshot_io::{list_canonical_files, read_snapshot};
use crate::ScanError;

pub const MIN_BUCKET_FILES: usize = 2;
pub const MIN_REFERENCE_FILES: usize = 5;

pub const WATCHLIST_COLUMNS: [&str; 6] = ["Symbol", "Series", "Close", "Volume", "Date", "Roc"];

/// `(latest − earliest) / earliest × 100`, or `None` when the base close is
/// zero or either value is not finite.
pub fn rate_of_change(earliest: f64, latest: f64) -> Option<f64> {
    if earliest == 0.0 || !earliest.is_finite() || !latest.is_finite() {
        return None;
    }
    Some((latest - earliest) / earliest * 100.0)
}

/// ROC for every symbol present in both snapshots. Symbols missing from
/// either side are left out.
pub fn compute_roc(earliest: &Snapshot, latest: &Snapshot) -> HashMap<String, f64> {
    let base = earliest.closes();
    let mut roc = HashMap::new();
    for (symbol, close) in latest.closes() {
        let Some(&old_close) = base.get(symbol) else {
            continue;
        };
        if let Some(value) = rate_of_change(old_close, close) {
            roc.insert(symbol.to_owned(), value);
        }
    }
    roc
}

/// Closes of a symbol in the four reference snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceCloses {
    pub cmp: Option<f64>,
    pub d1: Option<f64>,
    pub d2: Option<f64>,
    pub d3: Option<f64>,
}

/// `a` lies strictly inside `b ± tolerance·b`. A missing side never passes.
pub fn within_band(a: Option<f64>, b: Option<f64>, tolerance: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a < (1.0 + tolerance) * b && a > (1.0 - tolerance) * b,
        _ => false,
    }
}

/// A ranked candidate from the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub series: String,
    pub close: f64,
    pub volume: u64,
    pub date: String,
    pub roc: f64,
    #[serde(skip)]
    pub reference: ReferenceCloses,
}

impl WatchlistEntry {
    /// (Close,Cmp), (Cmp,D1), (D1,D2), (D2,D3) closeness checks.
    pub fn pair_checks(&self, tolerance: f64) -> [bool; 4] {
        let r = &self.reference;
        [
            within_band(Some(self.close), r.cmp, tolerance),
            within_band(r.cmp, r.d1, tolerance),
            within_band(r.d1, r.d2, tolerance),
            within_band(r.d2, r.d3, tolerance),
        ]
    }

    pub fn is_stable(&self, condition: StabilityCondition, tolerance: f64) -> bool {
        condition.combine(self.pair_checks(tolerance))
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.symbol.as_str()),
            Cell::from(self.series.as_str()),
            Cell::from(self.close),
            Cell::from(self.volume),
            Cell::from(self.date.as_str()),
            Cell::from(self.roc),
        ]
    }
}

/// Ranked-series rows of `latest` that have a ROC, in file order.
pub fn candidates(latest: &Snapshot, roc: &HashMap<String, f64>) -> Vec<WatchlistEntry> {
    latest
        .rows
        .iter()
        .filter(|row| row.is_ranked())
        .filter_map(|row| {
            roc.get(&row.symbol).map(|&roc| WatchlistEntry {
                symbol: row.symbol.clone(),
                series: row.series.clone(),
                close: row.close,
                volume: row.volume,
                date: row.date.clone(),
                roc,
                reference: ReferenceCloses::default(),
            })
        })
        .collect()
}

/// Top `top_n` candidates by ROC. The sort is stable, so ties keep file order.
pub fn rank(candidates: &[WatchlistEntry], order: SortOrder, top_n: usize) -> Vec<WatchlistEntry> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(|left, right| {
        let ordering = left.roc.partial_cmp(&right.roc).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    ranked.truncate(top_n);
    ranked
}

/// Per-symbol closes of the four reference snapshots.
#[derive(Debug, Clone, Default)]
pub struct ReferenceWindow {
    cmp: HashMap<String, f64>,
    d1: HashMap<String, f64>,
    d2: HashMap<String, f64>,
    d3: HashMap<String, f64>,
}

impl ReferenceWindow {
    /// Snapshots ordered `[cmp, d1, d2, d3]`, newest first.
    pub fn from_snapshots(snapshots: [&Snapshot; 4]) -> Self {
        let owned = |snapshot: &Snapshot| {
            snapshot
                .closes()
                .into_iter()
                .map(|(symbol, close)| (symbol.to_owned(), close))
                .collect::<HashMap<_, _>>()
        };
        let [cmp, d1, d2, d3] = snapshots;
        Self {
            cmp: owned(cmp),
            d1: owned(d1),
            d2: owned(d2),
            d3: owned(d3),
        }
    }

    /// Picks the 2nd..5th most recent of `files` (file-name order, oldest
    /// first) and loads them.
    pub fn load(files: &[PathBuf]) -> Result<Self, ScanError> {
        let paths = reference_files(files).ok_or_else(|| ScanError::InsufficientData {
            folder: RecencyBucket::OneMonth.as_str().to_owned(),
            purpose: "closing filter analysis",
            required: MIN_REFERENCE_FILES,
            found: files.len(),
        })?;

        let cmp = read_snapshot(paths[0])?;
        let d1 = read_snapshot(paths[1])?;
        let d2 = read_snapshot(paths[2])?;
        let d3 = read_snapshot(paths[3])?;
        Ok(Self::from_snapshots([&cmp, &d1, &d2, &d3]))
    }

    pub fn closes_for(&self, symbol: &str) -> ReferenceCloses {
        ReferenceCloses {
            cmp: self.cmp.get(symbol).copied(),
            d1: self.d1.get(symbol).copied(),
            d2: self.d2.get(symbol).copied(),
            d3: self.d3.get(symbol).copied(),
        }
    }
}

/// `[cmp, d1, d2, d3]` paths: offsets 2..=5 from the newest file.
pub fn reference_files(files: &[PathBuf]) -> Option<[&Path; 4]> {
    let len = files.len();
    if len < MIN_REFERENCE_FILES {
        return None;
    }
    Some([
        files[len - 2].as_path(),
        files[len - 3].as_path(),
        files[len - 4].as_path(),
        files[len - 5].as_path(),
    ])
}

/// One filtered ranking, ready to be written.
#[derive(Debug, Clone, Serialize)]
pub struct Watchlist {
    pub bucket: RecencyBucket,
    pub order: SortOrder,
    pub condition: StabilityCondition,
    pub entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(WATCHLIST_COLUMNS);
        for entry in &self.entries {
            table.push_row(entry.to_cells());
        }
        table
    }
}

/// Builds the four watchlists of a bucket from already-loaded data.
pub fn build_watchlists(
    bucket: RecencyBucket,
    earliest: &Snapshot,
    latest: &Snapshot,
    reference: &ReferenceWindow,
    top_n: usize,
    tolerance: f64,
) -> Vec<Watchlist> {
    let roc = compute_roc(earliest, latest);
    let pool = candidates(latest, &roc);

    let mut watchlists = Vec::with_capacity(4);
    for order in SortOrder::ALL {
        let mut top = rank(&pool, order, top_n);
        for entry in &mut top {
            entry.reference = reference.closes_for(&entry.symbol);
        }

        for condition in StabilityCondition::ALL {
            let entries = top
                .iter()
                .filter(|entry| entry.is_stable(condition, tolerance))
                .cloned()
                .collect();
            watchlists.push(Watchlist {
                bucket,
                order,
                condition,
                entries,
            });
        }
    }
    watchlists
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenWatchlist {
    pub order: SortOrder,
    pub condition: StabilityCondition,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchlistReport {
    pub bucket: RecencyBucket,
    pub earliest: String,
    pub latest: String,
    pub candidates: usize,
    pub written: Vec<WrittenWatchlist>,
}

/// Loads a bucket and its reference window from disk and writes the four
/// watchlist tables under `RESULTS/<ORDER>/`.
pub struct WatchlistEngine<'a> {
    layout: &'a DataLayout,
    store: &'a dyn TableStore,
    top_n: usize,
    tolerance: f64,
}

impl<'a> WatchlistEngine<'a> {
    pub fn new(layout: &'a DataLayout, store: &'a dyn TableStore, top_n: usize, tolerance: f64) -> Self {
        Self {
            layout,
            store,
            top_n,
            tolerance,
        }
    }

    /// Fails with [`ScanError::InsufficientData`] when the bucket has fewer
    /// than two snapshots or `1 MONTH` fewer than five; nothing is written
    /// in that case.
    pub fn run(&self, bucket: RecencyBucket) -> Result<WatchlistReport, ScanError> {
        let folder = self.layout.bucket_dir(bucket);
        let files = list_canonical_files(&folder)?;
        if files.len() < MIN_BUCKET_FILES {
            return Err(ScanError::InsufficientData {
                folder: bucket.as_str().to_owned(),
                purpose: "comparison",
                required: MIN_BUCKET_FILES,
                found: files.len(),
            });
        }

        let reference_dir = self.layout.bucket_dir(RecencyBucket::OneMonth);
        let reference_files = if reference_dir.is_dir() {
            list_canonical_files(&reference_dir)?
        } else {
            Vec::new()
        };
        if reference_files.len() < MIN_REFERENCE_FILES {
            return Err(ScanError::InsufficientData {
                folder: RecencyBucket::OneMonth.as_str().to_owned(),
                purpose: "closing filter analysis",
                required: MIN_REFERENCE_FILES,
                found: reference_files.len(),
            });
        }

        let earliest = read_snapshot(&files[0])?;
        let latest = read_snapshot(&files[files.len() - 1])?;
        let reference = ReferenceWindow::load(&reference_files)?;

        let roc = compute_roc(&earliest, &latest);
        let candidate_count = candidates(&latest, &roc).len();
        let watchlists = build_watchlists(
            bucket,
            &earliest,
            &latest,
            &reference,
            self.top_n,
            self.tolerance,
        );

        let mut written = Vec::with_capacity(watchlists.len());
        for watchlist in &watchlists {
            let path = self.layout.watchlist_path(
                bucket,
                watchlist.order,
                watchlist.condition,
                self.store.format(),
            );
            self.store.write_table(&path, &watchlist.to_table())?;
            info!(
                "Generated {} condition results: {}",
                watchlist.condition,
                path.display()
            );
            written.push(WrittenWatchlist {
                order: watchlist.order,
                condition: watchlist.condition,
                path,
                rows: watchlist.entries.len(),
            });
        }

        Ok(WatchlistReport {
            bucket,
            earliest: earliest.file_name(),
            latest: latest.file_name(),
            candidates: candidate_count,
            written,
        })
    }
}
