use std::path::Path;

use ::csv::{ReaderBuilder, Trim, Writer};

use crate::{ensure_parent, Cell, StoreError, Table, TableFormat, TableStore};

/// Comma-separated tables with a header record.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStore;

impl TableStore for CsvStore {
    fn format(&self) -> TableFormat {
        TableFormat::Csv
    }

    fn read_table(&self, path: &Path) -> Result<Table, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)?;

        let mut table = Table::new(reader.headers()?.iter());
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(parse_cell).collect());
        }

        Ok(table)
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<(), StoreError> {
        ensure_parent(path)?;

        let mut writer = Writer::from_path(path)?;
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_cell(value: &str) -> Cell {
    if value.is_empty() {
        return Cell::Empty;
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Cell::Number(number),
        _ => Cell::Text(value.to_owned()),
    }
}
