//! Raw exchange file normalisation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{canonical_file_name, raw_file_date};
use crate::error::FileFailure;
use crate::snapshot_io::{display_name, list_raw_files, read_raw_rows, write_snapshot};
use crate::ScanError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub scanned: usize,
    pub produced: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// Converts `BhavCopy*.csv` files into canonical `YYYY-MM-DD-NSE-NEW.csv`
/// snapshots in the same folder and removes the raw input.
#[derive(Debug, Clone)]
pub struct SnapshotIngestor {
    data_dir: PathBuf,
}

impl SnapshotIngestor {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Ingests every raw file. A failing file is logged, recorded and left on
    /// disk; the batch carries on.
    pub fn ingest_all(&self) -> Result<IngestReport, ScanError> {
        let mut report = IngestReport::default();

        for path in list_raw_files(&self.data_dir)? {
            report.scanned += 1;
            let file = display_name(&path);
            match self.ingest_file(&path) {
                Ok(canonical) => report.produced.push(canonical),
                Err(error) => {
                    warn!("Error processing file {file}: {error}");
                    report.failures.push(FileFailure::new(file, &error));
                }
            }
        }

        Ok(report)
    }

    /// Normalises one raw file and returns the canonical path.
    ///
    /// The raw file is deleted only once the canonical file is fully written.
    pub fn ingest_file(&self, path: &Path) -> Result<PathBuf, ScanError> {
        let file = display_name(path);
        let date = raw_file_date(&file)?;
        let rows = read_raw_rows(path)?;

        let canonical_name = canonical_file_name(date);
        let canonical = self.data_dir.join(&canonical_name);
        let staging = self.data_dir.join(format!("{canonical_name}.partial"));

        if let Err(error) = write_snapshot(&staging, &rows) {
            let _ = fs::remove_file(&staging);
            return Err(error);
        }
        if let Err(error) = fs::rename(&staging, &canonical) {
            let _ = fs::remove_file(&staging);
            return Err(error.into());
        }
        info!("Preprocessed and saved {file} to {canonical_name}");

        fs::remove_file(path)?;
        info!("Removed original file: {file}");

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_io::read_snapshot;
    use tempfile::tempdir;

    const RAW: &str = "\
TradDt,BizDt,Sgmt,TckrSymb,SctySrs,OpnPric,HghPric,LwPric,ClsPric,TtlTradgVol,FinInstrmNm
2024-06-21,2024-06-21,CM,ABC,EQ,49.00,51.00,48.00,50.00,1200,ABC LIMITED
2024-06-21,2024-06-21,CM,XYZ,SM,10.00,11.00,9.00,10.50,300,XYZ LIMITED
";

    #[test]
    fn ingests_raw_file_into_canonical_schema() {
        let temp = tempdir().expect("tempdir");
        let raw = temp.path().join("BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv");
        fs::write(&raw, RAW).expect("write raw");

        let canonical = SnapshotIngestor::new(temp.path())
            .ingest_file(&raw)
            .expect("ingest");

        assert_eq!(display_name(&canonical), "2024-06-21-NSE-NEW.csv");
        assert!(!raw.exists(), "raw file must be removed");
        assert!(!temp.path().join("2024-06-21-NSE-NEW.csv.partial").exists());

        let snapshot = read_snapshot(&canonical).expect("read canonical");
        assert_eq!(snapshot.rows.len(), 2);
        let abc = &snapshot.rows[0];
        assert_eq!(abc.symbol, "ABC");
        assert_eq!(abc.date, "2024-06-21");
        assert_eq!(abc.close, 50.0);
        assert_eq!(abc.volume, 1200);
        assert_eq!(abc.name, "ABC LIMITED");
        assert_eq!(abc.series, "EQ");
    }

    #[test]
    fn schema_failure_keeps_raw_file() {
        let temp = tempdir().expect("tempdir");
        let raw = temp.path().join("BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv");
        fs::write(&raw, "TckrSymb,ClsPric\nABC,50\n").expect("write raw");

        let err = SnapshotIngestor::new(temp.path())
            .ingest_file(&raw)
            .expect_err("must fail");

        assert!(matches!(err, ScanError::Schema { .. }));
        assert!(raw.exists());
        assert!(!temp.path().join("2024-06-21-NSE-NEW.csv").exists());
    }

    #[test]
    fn failed_rename_removes_staging_file() {
        let temp = tempdir().expect("tempdir");
        let raw = temp.path().join("BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv");
        fs::write(&raw, RAW).expect("write raw");
        // A non-empty directory at the canonical path cannot be replaced.
        let blocker = temp.path().join("2024-06-21-NSE-NEW.csv");
        fs::create_dir(&blocker).expect("create blocker");
        fs::write(blocker.join("keep"), "").expect("fill blocker");

        let err = SnapshotIngestor::new(temp.path())
            .ingest_file(&raw)
            .expect_err("must fail");

        assert!(matches!(err, ScanError::Io(_)), "{err:?}");
        assert!(!temp.path().join("2024-06-21-NSE-NEW.csv.partial").exists());
        assert!(raw.exists());
    }
}
