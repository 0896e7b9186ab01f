//! Batch artifact persistence.
//!
//! The scrape's output is one worksheet holding the concatenated score
//! records, one row per student. Numeric cells are written as numbers so
//! re-reading the artifact reproduces the batch table exactly.

use std::path::Path;

use umya_spreadsheet::Worksheet;

use scorescrape_core::model::{BatchTable, Cell};

use crate::error::LedgerError;

/// Sheet the batch table lives on.
pub const BATCH_SHEET: &str = "汇总";

/// Write the batch table to a new workbook at `path`.
pub fn write_batch(path: &Path, table: &BatchTable) -> Result<(), LedgerError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| LedgerError::SheetMissing(BATCH_SHEET.into()))?;
    sheet.set_name(BATCH_SHEET);

    for (i, name) in table.columns.iter().enumerate() {
        sheet
            .get_cell_mut((i as u32 + 1, 1))
            .set_value_string(name.as_str());
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            write_cell(sheet, c as u32 + 1, r as u32 + 2, cell);
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| LedgerError::write(path, format!("{e:?}")))
}

/// Read a batch table back from a workbook.
///
/// Looks for the batch sheet by name, falling back to the first sheet for
/// hand-renamed artifacts.
pub fn read_batch(path: &Path) -> Result<BatchTable, LedgerError> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| LedgerError::read(path, format!("{e:?}")))?;
    let sheet = book
        .get_sheet_by_name(BATCH_SHEET)
        .or_else(|| book.get_sheet(&0))
        .ok_or_else(|| LedgerError::SheetMissing(BATCH_SHEET.into()))?;

    let highest_col = sheet.get_highest_column();
    let highest_row = sheet.get_highest_row();

    let mut columns = Vec::new();
    for c in 1..=highest_col {
        columns.push(cell_text(sheet, c, 1));
    }

    let mut rows = Vec::new();
    for r in 2..=highest_row {
        let mut row = Vec::with_capacity(columns.len());
        for c in 1..=highest_col {
            row.push(read_cell(sheet, c, r));
        }
        rows.push(row);
    }

    Ok(BatchTable { columns, rows })
}

pub(crate) fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, cell: &Cell) {
    match cell {
        Cell::Number(n) => {
            sheet.get_cell_mut((col, row)).set_value_number(*n);
        }
        Cell::Text(t) => {
            if !t.is_empty() {
                sheet.get_cell_mut((col, row)).set_value_string(t.as_str());
            }
        }
    }
}

pub(crate) fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|c| c.get_value().to_string())
        .unwrap_or_default()
}

/// Reconstruct a typed cell: explicit string cells stay text, everything
/// else that parses is a number.
pub(crate) fn read_cell(sheet: &Worksheet, col: u32, row: u32) -> Cell {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return Cell::empty();
    };
    let value = cell.get_value().to_string();
    if value.is_empty() {
        return Cell::empty();
    }
    let data_type = cell.get_data_type();
    if matches!(data_type, "s" | "str" | "inlineStr") {
        return Cell::Text(value);
    }
    match value.parse::<f64>() {
        Ok(n) => Cell::Number(n),
        Err(_) => Cell::Text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> BatchTable {
        BatchTable {
            columns: vec!["姓名".into(), "总分".into(), "班级".into(), "备注".into()],
            rows: vec![
                vec![
                    Cell::Text("甲".into()),
                    Cell::Number(419.5),
                    Cell::Number(19.0),
                    Cell::Text("123".into()),
                ],
                vec![
                    Cell::Text("乙".into()),
                    Cell::Number(388.0),
                    Cell::Number(19.0),
                    Cell::empty(),
                ],
            ],
        }
    }

    #[test]
    fn round_trip_preserves_order_and_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("汇总成绩.xlsx");

        let table = sample_table();
        write_batch(&path, &table).unwrap();
        let back = read_batch(&path).unwrap();

        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows.len(), 2);
        // numeric cells come back as numbers without precision loss
        assert_eq!(back.rows[0][1], Cell::Number(419.5));
        // digit-looking text stays text thanks to the explicit string type
        assert_eq!(back.rows[0][3], Cell::Text("123".into()));
        assert_eq!(back, table);
    }

    #[test]
    fn read_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = read_batch(&dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, LedgerError::WorkbookRead { .. }));
    }
}
