//! Raw and canonical snapshot file naming.
//!
//! Raw exchange files look like `BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv`;
//! the trade date is the 7th underscore-delimited token. Canonical files are
//! named `2024-06-21-NSE-NEW.csv` so lexicographic order is chronological.

use time::{Date, Month};

use crate::ScanError;

pub const RAW_PREFIX: &str = "BhavCopy";
pub const RAW_EXTENSION: &str = ".csv";
pub const CANONICAL_SUFFIX: &str = "-NSE-NEW.csv";

const RAW_DATE_TOKEN_INDEX: usize = 6;

pub fn is_raw_file_name(name: &str) -> bool {
    name.starts_with(RAW_PREFIX) && name.ends_with(RAW_EXTENSION)
}

pub fn is_canonical_file_name(name: &str) -> bool {
    name.ends_with(CANONICAL_SUFFIX)
}

pub fn canonical_file_name(date: Date) -> String {
    format!("{date}{CANONICAL_SUFFIX}")
}

/// Trade date encoded in a raw file name as `YYYYMMDD`.
pub fn raw_file_date(name: &str) -> Result<Date, ScanError> {
    let token = name
        .split('_')
        .nth(RAW_DATE_TOKEN_INDEX)
        .ok_or_else(|| filename_error(name, "missing date token"))?;

    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(filename_error(
            name,
            format!("date token '{token}' is not YYYYMMDD"),
        ));
    }

    build_date(name, &token[0..4], &token[4..6], &token[6..8])
}

/// Trade date encoded in a canonical file name as `YYYY-MM-DD`.
pub fn canonical_file_date(name: &str) -> Result<Date, ScanError> {
    let mut parts = name.splitn(4, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(filename_error(name, "expected YYYY-MM-DD prefix"));
    };

    let well_formed = [(year, 4), (month, 2), (day, 2)]
        .iter()
        .all(|(part, len)| part.len() == *len && part.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(filename_error(name, "expected YYYY-MM-DD prefix"));
    }

    build_date(name, year, month, day)
}

fn build_date(name: &str, year: &str, month: &str, day: &str) -> Result<Date, ScanError> {
    let invalid = || filename_error(name, format!("{year}-{month}-{day} is not a calendar date"));

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let day: u8 = day.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

fn filename_error(name: &str, reason: impl Into<String>) -> ScanError {
    ScanError::FilenameParse {
        file: name.to_owned(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_date_token() {
        let date = raw_file_date("BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv").expect("must parse");
        assert_eq!(canonical_file_name(date), "2024-06-21-NSE-NEW.csv");
    }

    #[test]
    fn rejects_raw_name_without_token() {
        let err = raw_file_date("BhavCopy_NSE_CM.csv").expect_err("must fail");
        assert!(matches!(err, ScanError::FilenameParse { .. }));
    }

    #[test]
    fn rejects_impossible_raw_date() {
        let err = raw_file_date("BhavCopy_NSE_CM_0_0_0_20240231_F_0000.csv").expect_err("must fail");
        assert!(matches!(err, ScanError::FilenameParse { .. }));
    }

    #[test]
    fn parses_canonical_name_round_trip() {
        let date = canonical_file_date("2024-01-05-NSE-NEW.csv").expect("must parse");
        assert_eq!(canonical_file_name(date), "2024-01-05-NSE-NEW.csv");
    }

    #[test]
    fn rejects_malformed_canonical_name() {
        let err = canonical_file_date("latest-NSE-NEW.csv").expect_err("must fail");
        assert!(matches!(err, ScanError::FilenameParse { .. }));
    }

    #[test]
    fn classifies_names() {
        assert!(is_raw_file_name("BhavCopy_NSE_CM_0_0_0_20240621_F_0000.csv"));
        assert!(!is_raw_file_name("bhavcopy.csv"));
        assert!(is_canonical_file_name("2024-06-21-NSE-NEW.csv"));
        assert!(!is_canonical_file_name("2024-06-21.csv"));
    }
}
