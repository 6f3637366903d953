//! Behavior-driven tests for bucket ledgers
//!
//! These tests verify what ends up in `<bucket>.<ext>` after one or more
//! aggregation runs under each merge mode.

mod common;

use bhavscan_core::{AggregationService, DataLayout, LedgerMode, RecencyBucket, LEDGER_COLUMNS};
use bhavscan_store::{Cell, CsvStore, TableFormat, TableStore, XlsxStore};
use common::{date, write_canonical};
use tempfile::tempdir;
use time::Month;

fn seed_five_day_bucket(layout: &DataLayout) {
    let bucket = layout.bucket_dir(RecencyBucket::FiveDays);
    write_canonical(
        &bucket,
        date(2024, Month::June, 20),
        &[("ABC", "EQ", 50.0), ("XYZ", "SM", 9.0)],
    );
    write_canonical(
        &bucket,
        date(2024, Month::June, 21),
        &[("ABC", "EQ", 55.0), ("DEF", "BE", 20.0)],
    );
}

// =============================================================================
// Ledger: Contents
// =============================================================================

#[test]
fn when_bucket_is_aggregated_only_ranked_series_reach_the_ledger() {
    // Given: A 5-day bucket with EQ, BE and SM rows
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    seed_five_day_bucket(&layout);

    // When: The bucket is aggregated into a CSV ledger
    let report = AggregationService::new(&layout, &CsvStore, LedgerMode::Upsert)
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("aggregate");

    // Then: The ledger holds the projected EQ/BE rows in file order
    assert!(report.created);
    assert_eq!(report.files_read, 2);
    assert_eq!(report.ledger_rows, 3);

    let path = layout.ledger_path(RecencyBucket::FiveDays, TableFormat::Csv);
    assert_eq!(report.ledger_path.as_deref(), Some(path.as_path()));

    let table = CsvStore.read_table(&path).expect("read ledger");
    assert_eq!(table.columns(), LEDGER_COLUMNS);
    let symbols: Vec<String> = table.rows().iter().map(|row| row[0].to_string()).collect();
    assert_eq!(symbols, ["ABC", "ABC", "DEF"]);
    assert_eq!(table.rows()[1][2], Cell::Number(55.0));
    assert_eq!(table.rows()[2][4], Cell::Text(String::from("2024-06-21")));
}

#[test]
fn when_bucket_has_no_snapshots_no_ledger_is_written() {
    // Given: An empty 5-day bucket folder
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    std::fs::create_dir_all(layout.bucket_dir(RecencyBucket::FiveDays)).expect("bucket dir");

    // When: The bucket is aggregated
    let report = AggregationService::new(&layout, &CsvStore, LedgerMode::Upsert)
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("aggregate");

    // Then: Nothing is written
    assert_eq!(report.files_read, 0);
    assert!(report.ledger_path.is_none());
    assert!(!layout
        .ledger_path(RecencyBucket::FiveDays, TableFormat::Csv)
        .exists());
}

#[test]
fn when_a_snapshot_lacks_a_column_it_is_skipped_and_reported() {
    // Given: A 5-day bucket with one good file and one missing Series
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    let bucket = layout.bucket_dir(RecencyBucket::FiveDays);
    write_canonical(
        &bucket,
        date(2024, Month::June, 21),
        &[("ABC", "EQ", 55.0), ("DEF", "BE", 20.0), ("XYZ", "SM", 9.0)],
    );
    std::fs::write(
        bucket.join("2024-06-19-NSE-NEW.csv"),
        "Symbol,Date,Open,High,Low,Close,Volume,Name\n\
         ABC,2024-06-19,50,51,49,50,1000,ABC LTD\n",
    )
    .expect("write bad file");

    // When: The bucket is aggregated
    let report = AggregationService::new(&layout, &CsvStore, LedgerMode::Append)
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("aggregate");

    // Then: The bad file is reported as a schema failure
    assert_eq!(report.files_read, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "schema");
    assert_eq!(report.failures[0].file, "2024-06-19-NSE-NEW.csv");

    // And: The ledger holds only the good file's ranked rows
    let table = CsvStore
        .read_table(&layout.ledger_path(RecencyBucket::FiveDays, TableFormat::Csv))
        .expect("read ledger");
    let symbols: Vec<String> = table.rows().iter().map(|row| row[0].to_string()).collect();
    assert_eq!(symbols, ["ABC", "DEF"]);
}

// =============================================================================
// Ledger: Merge Modes
// =============================================================================

#[test]
fn when_append_mode_reruns_the_ledger_doubles() {
    // Given: A seeded bucket
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    seed_five_day_bucket(&layout);
    let service = AggregationService::new(&layout, &CsvStore, LedgerMode::Append);

    // When: The same bucket is aggregated twice
    let first = service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("first run");
    let second = service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("second run");

    // Then: Every row appears twice
    assert_eq!(first.ledger_rows, 3);
    assert!(!second.created);
    assert_eq!(second.ledger_rows, 6);
}

#[test]
fn when_upsert_mode_reruns_the_ledger_is_unchanged() {
    // Given: A seeded bucket and an xlsx ledger
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    seed_five_day_bucket(&layout);
    let service = AggregationService::new(&layout, &XlsxStore, LedgerMode::Upsert);

    // When: The same bucket is aggregated twice
    service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("first run");
    let path = layout.ledger_path(RecencyBucket::FiveDays, TableFormat::Xlsx);
    let after_first = XlsxStore.read_table(&path).expect("read first");
    let second = service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("second run");
    let after_second = XlsxStore.read_table(&path).expect("read second");

    // Then: The ledger is identical after both runs
    assert_eq!(second.ledger_rows, 3);
    assert_eq!(after_first, after_second);
}

#[test]
fn when_a_snapshot_is_corrected_upsert_replaces_the_stored_row() {
    // Given: A ledger built from the original snapshot
    let temp = tempdir().expect("tempdir");
    let layout = DataLayout::new(temp.path());
    seed_five_day_bucket(&layout);
    let service = AggregationService::new(&layout, &CsvStore, LedgerMode::Upsert);
    service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("first run");

    // When: The 21st is re-issued with a corrected ABC close
    write_canonical(
        &layout.bucket_dir(RecencyBucket::FiveDays),
        date(2024, Month::June, 21),
        &[("ABC", "EQ", 56.0), ("DEF", "BE", 20.0)],
    );
    service
        .aggregate_bucket(RecencyBucket::FiveDays)
        .expect("second run");

    // Then: The row keeps its position and carries the new close
    let table = CsvStore
        .read_table(&layout.ledger_path(RecencyBucket::FiveDays, TableFormat::Csv))
        .expect("read ledger");
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[1][0], Cell::Text(String::from("ABC")));
    assert_eq!(table.rows()[1][2], Cell::Number(56.0));
}
