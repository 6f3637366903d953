use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};

use crate::{ensure_parent, Cell, StoreError, Table, TableFormat, TableStore};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// `.xlsx` workbooks with a single worksheet, header in row 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxStore;

impl TableStore for XlsxStore {
    fn format(&self) -> TableFormat {
        TableFormat::Xlsx
    }

    fn read_table(&self, path: &Path) -> Result<Table, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| StoreError::EmptyWorkbook {
                path: path.to_path_buf(),
            })??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Table::default());
        };

        let mut table = Table::new(header.iter().map(|value| value.to_string()));
        for row in rows {
            table.push_row(row.iter().map(to_cell).collect());
        }

        Ok(table)
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<(), StoreError> {
        if table.len() + 1 > MAX_ROWS || table.columns().len() > MAX_COLUMNS {
            return Err(StoreError::TooLarge {
                rows: table.len(),
                columns: table.columns().len(),
            });
        }
        ensure_parent(path)?;

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();

        for (col, name) in table.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        }

        for (index, row) in table.rows().iter().enumerate() {
            let row_number = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Empty => {}
                    Cell::Text(value) => {
                        worksheet.write_string(row_number, col as u16, value)?;
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(row_number, col as u16, *value)?;
                    }
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(value) if value.is_empty() => Cell::Empty,
        Data::String(value) => Cell::Text(value.clone()),
        other => Cell::Text(other.to_string()),
    }
}
