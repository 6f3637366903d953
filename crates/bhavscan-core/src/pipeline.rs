//! One batch run: ingest, route, then aggregate and rank each bucket.

use bhavscan_store::TableStore;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aggregate::{AggregateReport, AggregationService};
use crate::clock::Clock;
use crate::config::ScanConfig;
use crate::domain::RecencyBucket;
use crate::ingest::{IngestReport, SnapshotIngestor};
use crate::router::{RetentionRouter, RouteReport};
use crate::watchlist::{WatchlistEngine, WatchlistReport};
use crate::ScanError;

/// What happened to one bucket during a run.
#[derive(Debug, Clone, Serialize)]
pub struct BucketOutcome {
    pub bucket: RecencyBucket,
    pub present: bool,
    pub aggregate: Option<AggregateReport>,
    pub watchlists: Option<WatchlistReport>,
    /// Bucket-level errors (not per-file ones) that stopped a stage.
    pub errors: Vec<String>,
}

impl BucketOutcome {
    fn missing(bucket: RecencyBucket) -> Self {
        Self {
            bucket,
            present: false,
            aggregate: None,
            watchlists: None,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub data_found: bool,
    pub results_dirs_created: Vec<std::path::PathBuf>,
    pub ingest: IngestReport,
    pub routing: RouteReport,
    pub buckets: Vec<BucketOutcome>,
}

impl RunReport {
    fn new(started_at: OffsetDateTime) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            data_found: false,
            results_dirs_created: Vec::new(),
            ingest: IngestReport::default(),
            routing: RouteReport::default(),
            buckets: Vec::new(),
        }
    }

    /// Per-file failures plus bucket-level errors.
    pub fn problem_count(&self) -> usize {
        let bucket_problems: usize = self
            .buckets
            .iter()
            .map(|outcome| {
                outcome.errors.len()
                    + outcome
                        .aggregate
                        .as_ref()
                        .map_or(0, |report| report.failures.len())
            })
            .sum();
        self.ingest.failures.len() + self.routing.failures.len() + bucket_problems
    }
}

/// Runs every stage against one directory layout.
///
/// Stages are fail-soft: a bad file or a short bucket is logged and recorded
/// in the [`RunReport`], and the run moves on. Only errors that make the
/// layout itself unusable (an unreadable `DATA` folder, an uncreatable
/// `RESULTS` folder) are returned.
pub struct Pipeline<'a> {
    config: &'a ScanConfig,
    clock: &'a dyn Clock,
    store: &'a dyn TableStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ScanConfig, clock: &'a dyn Clock, store: &'a dyn TableStore) -> Self {
        Self {
            config,
            clock,
            store,
        }
    }

    pub fn run(&self) -> Result<RunReport, ScanError> {
        let layout = &self.config.layout;
        let router = RetentionRouter::new(layout, self.clock, self.config.retention);
        let mut report = RunReport::new(router.now());

        let data_dir = layout.data_dir();
        if !data_dir.is_dir() {
            error!("DATA folder not found.");
            return Ok(report);
        }
        report.data_found = true;

        report.results_dirs_created = layout.ensure_results_dirs()?;
        for dir in &report.results_dirs_created {
            info!("Created {}", dir.display());
        }

        report.ingest = SnapshotIngestor::new(&data_dir).ingest_all()?;
        report.routing = router.route_all()?;

        let aggregator = AggregationService::new(layout, self.store, self.config.ledger_mode);
        let engine = WatchlistEngine::new(
            layout,
            self.store,
            self.config.top_n,
            self.config.tolerance,
        );

        for bucket in RecencyBucket::ALL {
            let folder = layout.bucket_dir(bucket);
            if !folder.is_dir() {
                info!("{} does not exist, skipping.", folder.display());
                report.buckets.push(BucketOutcome::missing(bucket));
                continue;
            }

            let mut outcome = BucketOutcome::missing(bucket);
            outcome.present = true;

            match aggregator.aggregate_bucket(bucket) {
                Ok(aggregate) => outcome.aggregate = Some(aggregate),
                Err(error) => {
                    warn!("Error aggregating {bucket}: {error}");
                    outcome.errors.push(error.to_string());
                }
            }

            match engine.run(bucket) {
                Ok(watchlists) => outcome.watchlists = Some(watchlists),
                Err(error @ ScanError::InsufficientData { .. }) => {
                    info!("{error}");
                    outcome.errors.push(error.to_string());
                }
                Err(error) => {
                    warn!("Error ranking {bucket}: {error}");
                    outcome.errors.push(error.to_string());
                }
            }

            report.buckets.push(outcome);
        }

        info!(
            run_id = %report.run_id,
            problems = report.problem_count(),
            "Run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use bhavscan_store::TableFormat;
    use tempfile::tempdir;
    use time::{Date, Month};

    #[test]
    fn missing_data_folder_stops_before_creating_results() {
        let temp = tempdir().expect("tempdir");
        let config = ScanConfig::new(temp.path());
        let clock = FixedClock::at_noon(
            Date::from_calendar_date(2024, Month::June, 21).expect("valid date"),
        );
        let store = TableFormat::Csv.open_store();

        let report = Pipeline::new(&config, &clock, store.as_ref())
            .run()
            .expect("run");

        assert!(!report.data_found);
        assert!(report.buckets.is_empty());
        assert!(!config.layout.results_dir().exists());
    }

    #[test]
    fn empty_data_folder_skips_every_bucket() {
        let temp = tempdir().expect("tempdir");
        let config = ScanConfig::new(temp.path());
        std::fs::create_dir_all(config.layout.data_dir()).expect("data dir");
        let clock = FixedClock::at_noon(
            Date::from_calendar_date(2024, Month::June, 21).expect("valid date"),
        );
        let store = TableFormat::Csv.open_store();

        let report = Pipeline::new(&config, &clock, store.as_ref())
            .run()
            .expect("run");

        assert!(report.data_found);
        assert_eq!(report.results_dirs_created.len(), 3);
        assert_eq!(report.buckets.len(), 3);
        assert!(report.buckets.iter().all(|outcome| !outcome.present));
        assert_eq!(report.problem_count(), 0);

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["buckets"][0]["bucket"], "5 DAYS");
    }
}
