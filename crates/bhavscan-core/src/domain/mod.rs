pub mod bucket;
pub mod file_name;
pub mod ranking;
pub mod snapshot;

pub use bucket::RecencyBucket;
pub use file_name::{
    canonical_file_date, canonical_file_name, is_canonical_file_name, is_raw_file_name,
    raw_file_date,
};
pub use ranking::{SortOrder, StabilityCondition};
pub use snapshot::{is_ranked_series, Snapshot, SnapshotRow, CANONICAL_COLUMNS, RANKED_SERIES};
