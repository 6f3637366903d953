//! Copies canonical snapshots into the recency buckets they qualify for.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{DataLayout, RetentionMode};
use crate::domain::{canonical_file_date, RecencyBucket};
use crate::error::FileFailure;
use crate::snapshot_io::{display_name, list_canonical_files};
use crate::ScanError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteReport {
    pub routed_files: usize,
    pub copies: BTreeMap<RecencyBucket, usize>,
    pub pruned: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// Routes snapshots against a "now" captured once at construction.
///
/// Cutoffs are evaluated independently per bucket, so a recent file lands in
/// all three. With [`RetentionMode::Prune`] a sweep afterwards removes bucket
/// copies that have aged out of their window.
#[derive(Debug, Clone)]
pub struct RetentionRouter<'a> {
    layout: &'a DataLayout,
    now: OffsetDateTime,
    retention: RetentionMode,
}

impl<'a> RetentionRouter<'a> {
    pub fn new(layout: &'a DataLayout, clock: &dyn Clock, retention: RetentionMode) -> Self {
        Self {
            layout,
            now: clock.now(),
            retention,
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    /// Buckets a file dated `date` belongs to, widest first.
    pub fn qualifying_buckets(&self, date: Date) -> Vec<RecencyBucket> {
        RecencyBucket::WIDEST_FIRST
            .into_iter()
            .filter(|bucket| bucket.includes(date, self.now))
            .collect()
    }

    /// Copies one snapshot into every qualifying bucket, creating bucket
    /// folders on first use.
    pub fn route_file(&self, path: &Path, date: Date) -> Result<Vec<RecencyBucket>, ScanError> {
        let file_name = path.file_name().ok_or_else(|| ScanError::FilenameParse {
            file: path.display().to_string(),
            reason: String::from("path has no file name"),
        })?;

        let buckets = self.qualifying_buckets(date);
        for bucket in &buckets {
            let dir = self.layout.bucket_dir(*bucket);
            fs::create_dir_all(&dir)?;
            fs::copy(path, dir.join(file_name))?;
            info!("Copied {} to {}", path.display(), dir.display());
        }
        Ok(buckets)
    }

    /// Routes every canonical snapshot currently in the data folder, then
    /// prunes when configured to.
    pub fn route_all(&self) -> Result<RouteReport, ScanError> {
        let mut report = RouteReport::default();

        for path in list_canonical_files(&self.layout.data_dir())? {
            let file = display_name(&path);
            let routed = canonical_file_date(&file).and_then(|date| self.route_file(&path, date));
            match routed {
                Ok(buckets) => {
                    report.routed_files += 1;
                    for bucket in buckets {
                        *report.copies.entry(bucket).or_default() += 1;
                    }
                }
                Err(error) => {
                    warn!("Error routing {file}: {error}");
                    report.failures.push(FileFailure::new(file, &error));
                }
            }
        }

        if self.retention == RetentionMode::Prune {
            self.prune_into(&mut report)?;
        }

        Ok(report)
    }

    /// Removes bucket copies older than the bucket's cutoff. The data-folder
    /// original is never touched.
    pub fn prune(&self) -> Result<RouteReport, ScanError> {
        let mut report = RouteReport::default();
        self.prune_into(&mut report)?;
        Ok(report)
    }

    fn prune_into(&self, report: &mut RouteReport) -> Result<(), ScanError> {
        for bucket in RecencyBucket::WIDEST_FIRST {
            let dir = self.layout.bucket_dir(bucket);
            if !dir.is_dir() {
                continue;
            }

            for path in list_canonical_files(&dir)? {
                let file = display_name(&path);
                match canonical_file_date(&file) {
                    Ok(date) if bucket.includes(date, self.now) => {}
                    Ok(_) => {
                        fs::remove_file(&path)?;
                        info!("Pruned {file} from {}", dir.display());
                        report.pruned.push(path);
                    }
                    Err(error) => {
                        warn!("Error pruning {file}: {error}");
                        report.failures.push(FileFailure::new(file, &error));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use time::Month;

    fn date(month: Month, day: u8) -> Date {
        Date::from_calendar_date(2024, month, day).expect("valid date")
    }

    #[test]
    fn recent_file_qualifies_for_every_bucket() {
        let layout = DataLayout::new(".");
        let clock = FixedClock::at_noon(date(Month::June, 21));
        let router = RetentionRouter::new(&layout, &clock, RetentionMode::Grow);

        assert_eq!(
            router.qualifying_buckets(date(Month::June, 20)),
            RecencyBucket::WIDEST_FIRST.to_vec()
        );
    }

    #[test]
    fn older_files_drop_out_of_narrow_buckets_first() {
        let layout = DataLayout::new(".");
        let clock = FixedClock::at_noon(date(Month::June, 21));
        let router = RetentionRouter::new(&layout, &clock, RetentionMode::Grow);

        assert_eq!(
            router.qualifying_buckets(date(Month::June, 10)),
            [RecencyBucket::ThreeMonths, RecencyBucket::OneMonth]
        );
        assert_eq!(
            router.qualifying_buckets(date(Month::May, 1)),
            [RecencyBucket::ThreeMonths]
        );
        assert!(router.qualifying_buckets(date(Month::January, 2)).is_empty());
    }
}
