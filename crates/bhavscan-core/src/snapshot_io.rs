//! Typed CSV reading and writing of market snapshots.
//!
//! Headers are resolved once per file into a column index; every record is
//! then parsed into a [`SnapshotRow`]. Bad values fail the whole file with
//! [`ScanError::InvalidValue`] instead of being coerced.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, Writer};

use crate::domain::{is_canonical_file_name, is_raw_file_name, Snapshot, SnapshotRow, CANONICAL_COLUMNS};
use crate::ScanError;

/// Raw exchange column feeding each canonical column, in canonical order.
pub const RAW_COLUMNS: [&str; 9] = [
    "TckrSymb",
    "TradDt",
    "OpnPric",
    "HghPric",
    "LwPric",
    "ClsPric",
    "TtlTradgVol",
    "FinInstrmNm",
    "SctySrs",
];

struct ColumnIndex([usize; 9]);

impl ColumnIndex {
    fn resolve(
        file: &str,
        headers: &StringRecord,
        names: &[&str; 9],
        normalize: fn(&str) -> String,
    ) -> Result<Self, ScanError> {
        let normalized: Vec<String> = headers.iter().map(normalize).collect();
        let mut index = [0usize; 9];
        let mut missing = Vec::new();

        for (slot, name) in names.iter().enumerate() {
            match normalized.iter().position(|header| header == name) {
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

        Ok(Self(index))
    }

    fn field<'r>(&self, record: &'r StringRecord, slot: usize) -> &'r str {
        record.get(self.0[slot]).unwrap_or_default()
    }
}

/// Reads a canonical snapshot. Header names are title-cased before matching,
/// so `SYMBOL` and `symbol` both satisfy `Symbol`.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, ScanError> {
    let rows = read_rows(path, &CANONICAL_COLUMNS, title_case)?;
    Ok(Snapshot::new(path, rows))
}

/// Reads a raw exchange file, mapping its columns onto the canonical schema.
pub fn read_raw_rows(path: &Path) -> Result<Vec<SnapshotRow>, ScanError> {
    read_rows(path, &RAW_COLUMNS, |header| header.to_owned())
}

/// Writes rows with the canonical header.
pub fn write_snapshot(path: &Path, rows: &[SnapshotRow]) -> Result<(), ScanError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(CANONICAL_COLUMNS)?;
    for row in rows {
        writer.write_record([
            row.symbol.clone(),
            row.date.clone(),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
            row.volume.to_string(),
            row.name.clone(),
            row.series.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Canonical snapshot files directly under `dir`, in file-name order.
pub fn list_canonical_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    list_files(dir, is_canonical_file_name)
}

/// Raw exchange files directly under `dir`, in file-name order.
pub fn list_raw_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    list_files(dir, is_raw_file_name)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn list_files(dir: &Path, accept: fn(&str) -> bool) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(accept) {
            files.push(entry.path());
        }
    }
    files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(files)
}

fn read_rows(
    path: &Path,
    names: &[&str; 9],
    normalize: fn(&str) -> String,
) -> Result<Vec<SnapshotRow>, ScanError> {
    let file = display_name(path);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let index = ColumnIndex::resolve(&file, reader.headers()?, names, normalize)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        rows.push(parse_record(&file, line, &index, &record)?);
    }
    Ok(rows)
}

fn parse_record(
    file: &str,
    line: u64,
    index: &ColumnIndex,
    record: &StringRecord,
) -> Result<SnapshotRow, ScanError> {
    let invalid = |slot: usize| ScanError::InvalidValue {
        file: file.to_owned(),
        line,
        column: CANONICAL_COLUMNS[slot],
        value: index.field(record, slot).to_owned(),
    };
    let price = |slot: usize| {
        index
            .field(record, slot)
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| invalid(slot))
    };

    let symbol = index.field(record, 0);
    if symbol.is_empty() {
        return Err(invalid(0));
    }

    Ok(SnapshotRow {
        symbol: symbol.to_owned(),
        date: index.field(record, 1).to_owned(),
        open: price(2)?,
        high: price(3)?,
        low: price(4)?,
        close: price(5)?,
        volume: parse_volume(index.field(record, 6)).ok_or_else(|| invalid(6))?,
        name: index.field(record, 7).to_owned(),
        series: index.field(record, 8).to_owned(),
    })
}

fn parse_volume(value: &str) -> Option<u64> {
    if let Ok(volume) = value.parse::<u64>() {
        return Some(volume);
    }
    let volume = value.parse::<f64>().ok()?;
    (volume.is_finite() && volume >= 0.0 && volume.fract() == 0.0).then_some(volume as u64)
}

/// Upper-cases the first letter of each alphabetic run and lower-cases the rest.
pub(crate) fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_alpha = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            output.push(ch);
            previous_alpha = false;
        }
    }
    output
}
