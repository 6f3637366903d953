//! Fixtures shared by the behaviour tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bhavscan_core::{write_snapshot, FixedClock, SnapshotRow};
use time::{Date, Month};

pub const RAW_HEADER: &str =
    "TradDt,BizDt,Sgmt,TckrSymb,SctySrs,OpnPric,HghPric,LwPric,ClsPric,TtlTradgVol,FinInstrmNm";

pub fn date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).expect("valid date")
}

pub fn clock_on(today: Date) -> FixedClock {
    FixedClock::at_noon(today)
}

pub fn raw_file_name(day: Date) -> String {
    format!(
        "BhavCopy_NSE_CM_0_0_0_{:04}{:02}{:02}_F_0000.csv",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

/// Writes a raw exchange file with one line per `(symbol, series, close)`.
pub fn write_raw(dir: &Path, day: Date, rows: &[(&str, &str, f64)]) -> PathBuf {
    let mut body = String::from(RAW_HEADER);
    body.push('\n');
    for (symbol, series, close) in rows {
        body.push_str(&format!(
            "{day},{day},CM,{symbol},{series},{close},{close},{close},{close},1000,{symbol} LTD\n"
        ));
    }
    let path = dir.join(raw_file_name(day));
    fs::write(&path, body).expect("write raw file");
    path
}

pub fn row(symbol: &str, series: &str, close: f64, day: Date) -> SnapshotRow {
    SnapshotRow {
        symbol: symbol.to_owned(),
        date: day.to_string(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
        name: format!("{symbol} LTD"),
        series: series.to_owned(),
    }
}

/// Writes `YYYY-MM-DD-NSE-NEW.csv` into `dir`, creating it if needed.
pub fn write_canonical(dir: &Path, day: Date, rows: &[(&str, &str, f64)]) -> PathBuf {
    fs::create_dir_all(dir).expect("create dir");
    let rows: Vec<_> = rows
        .iter()
        .map(|(symbol, series, close)| row(symbol, series, *close, day))
        .collect();
    let path = dir.join(format!("{day}-NSE-NEW.csv"));
    write_snapshot(&path, &rows).expect("write canonical file");
    path
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
