//! Ledger merge engine.
//!
//! The ledger workbook holds one hand-formatted sheet: exam names across
//! row 1, indicator names down column 1, indicator values in the body.
//! Merging writes exactly one column, found by exam name or appended at
//! the end with the neighboring column's formatting. The sheet is never
//! rebuilt, so every other cell's value and style survives untouched.

use std::collections::HashMap;
use std::path::Path;

use umya_spreadsheet::Worksheet;

use scorescrape_core::model::{Cell, NAME_COLUMN};

use crate::batch::{self, write_cell};
use crate::error::LedgerError;

/// Default ledger sheet name.
pub const LEDGER_SHEET: &str = "考试详情";

/// Outcome of one merge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// False when the exam already existed and overwrite was off.
    pub updated: bool,
    /// Whether a new column was appended.
    pub created_column: bool,
    /// Indicators that matched a ledger row and were written.
    pub matched: usize,
    /// 1-based column the exam lives in.
    pub column: u32,
}

/// Normalize an indicator name for matching: trim, drop embedded
/// whitespace and tabs, and canonicalize the 其他/其它 synonym pair.
pub fn normalize_indicator(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\u{3000}'))
        .collect::<String>()
        .replace("其他", "其它")
}

/// Merge one student's indicator values into the ledger as the column for
/// `exam`.
///
/// Indicators with no matching ledger row are skipped (and simply not
/// counted in `matched`); the caller reports the count rather than hiding
/// it. Row 1 and column 1 are never altered beyond the single new header
/// cell when a column is created.
pub fn merge_exam_column(
    path: &Path,
    sheet_name: &str,
    exam: &str,
    scores: &[(String, Cell)],
    overwrite: bool,
) -> Result<MergeReport, LedgerError> {
    let mut book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| LedgerError::read(path, format!("{e:?}")))?;
    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| LedgerError::SheetMissing(sheet_name.into()))?;

    let highest_row = sheet.get_highest_row();
    let highest_col = sheet.get_highest_column();

    let mut indicator_rows: HashMap<String, u32> = HashMap::new();
    for row in 2..=highest_row {
        let name = batch::cell_text(sheet, 1, row);
        if !name.is_empty() {
            indicator_rows
                .entry(normalize_indicator(&name))
                .or_insert(row);
        }
    }

    let existing = (1..=highest_col).find(|c| batch::cell_text(sheet, *c, 1) == exam);
    let (column, created_column) = match existing {
        Some(column) if !overwrite => {
            tracing::info!("exam '{exam}' already in ledger, skipping");
            return Ok(MergeReport {
                updated: false,
                created_column: false,
                matched: 0,
                column,
            });
        }
        Some(column) => (column, false),
        None => {
            let column = highest_col + 1;
            copy_column_styles(sheet, column - 1, column, highest_row);
            sheet.get_cell_mut((column, 1)).set_value_string(exam);
            (column, true)
        }
    };

    let mut matched = 0;
    for (indicator, value) in scores {
        if let Some(&row) = indicator_rows.get(&normalize_indicator(indicator)) {
            write_cell(sheet, column, row, value);
            matched += 1;
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| LedgerError::write(path, format!("{e:?}")))?;

    Ok(MergeReport {
        updated: true,
        created_column,
        matched,
        column,
    })
}

/// Clone the full cell styling of `from` onto `to` for every row, so a new
/// exam column looks like its neighbor without a template file.
fn copy_column_styles(sheet: &mut Worksheet, from: u32, to: u32, highest_row: u32) {
    for row in 1..=highest_row {
        let style = sheet.get_cell((from, row)).map(|c| c.get_style().clone());
        if let Some(style) = style {
            sheet.get_cell_mut((to, row)).set_style(style);
        }
    }
}

/// Pull one student's indicator row out of an exam workbook.
///
/// Reads the batch sheet, finds the row whose name column equals
/// `student`, and returns (normalized header, value) pairs ready for
/// [`merge_exam_column`].
pub fn extract_student_row(
    path: &Path,
    student: &str,
) -> Result<Vec<(String, Cell)>, LedgerError> {
    let table = batch::read_batch(path)?;
    let name_idx = table
        .column_index(NAME_COLUMN)
        .ok_or_else(|| LedgerError::StudentMissing(student.to_string()))?;

    let row = table
        .rows
        .iter()
        .find(|row| {
            row.get(name_idx)
                .map(|c| c.to_string().trim() == student)
                .unwrap_or(false)
        })
        .ok_or_else(|| LedgerError::StudentMissing(student.to_string()))?;

    Ok(table
        .columns
        .iter()
        .zip(row.iter())
        .map(|(name, cell)| (normalize_indicator(name), cell.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDICATORS: &[&str] = &["总分", "语文", "数学", "班级排名"];

    /// Build a ledger with one existing exam column and bold styling on it.
    fn seed_ledger(path: &Path) {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.set_name(LEDGER_SHEET);

        sheet.get_cell_mut((1, 1)).set_value_string("指标");
        for (i, name) in INDICATORS.iter().enumerate() {
            sheet
                .get_cell_mut((1, i as u32 + 2))
                .set_value_string(*name);
        }

        sheet.get_cell_mut((2, 1)).set_value_string("第一次月考");
        sheet.get_cell_mut((2, 2)).set_value_number(600);
        sheet.get_cell_mut((2, 3)).set_value_number(110);
        sheet.get_cell_mut((2, 4)).set_value_number(120);
        sheet.get_cell_mut((2, 5)).set_value_number(7);
        for row in 1..=5u32 {
            sheet
                .get_cell_mut((2, row))
                .get_style_mut()
                .get_font_mut()
                .set_bold(true);
        }

        umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
    }

    fn scores() -> Vec<(String, Cell)> {
        vec![
            ("总分".to_string(), Cell::Number(615.5)),
            ("语文".to_string(), Cell::Number(105.0)),
            // tab-decorated name must still match
            ("数 学\t".to_string(), Cell::Number(125.0)),
            // no such indicator row: silently skipped
            ("体育".to_string(), Cell::Number(99.0)),
        ]
    }

    #[test]
    fn appending_a_column_copies_neighbor_styles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.xlsx");
        seed_ledger(&path);

        let report =
            merge_exam_column(&path, LEDGER_SHEET, "期中考试", &scores(), false).unwrap();
        assert!(report.updated);
        assert!(report.created_column);
        assert_eq!(report.matched, 3);
        assert_eq!(report.column, 3);

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name(LEDGER_SHEET).unwrap();
        assert_eq!(sheet.get_cell((3, 1)).unwrap().get_value(), "期中考试");
        assert_eq!(sheet.get_cell((3, 2)).unwrap().get_value(), "615.5");
        // styling cloned from the previous column, row by row
        let prev = sheet.get_cell((2, 2)).unwrap().get_style().clone();
        let new = sheet.get_cell((3, 2)).unwrap().get_style().clone();
        assert_eq!(prev, new);
    }

    #[test]
    fn existing_columns_survive_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.xlsx");
        seed_ledger(&path);

        merge_exam_column(&path, LEDGER_SHEET, "期中考试", &scores(), false).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name(LEDGER_SHEET).unwrap();
        assert_eq!(sheet.get_cell((2, 1)).unwrap().get_value(), "第一次月考");
        assert_eq!(sheet.get_cell((2, 2)).unwrap().get_value(), "600");
        assert_eq!(sheet.get_cell((1, 2)).unwrap().get_value(), "总分");
    }

    #[test]
    fn overwrite_off_is_a_reported_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.xlsx");
        seed_ledger(&path);

        let report =
            merge_exam_column(&path, LEDGER_SHEET, "第一次月考", &scores(), false).unwrap();
        assert!(!report.updated);
        assert_eq!(report.matched, 0);

        // nothing changed
        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name(LEDGER_SHEET).unwrap();
        assert_eq!(sheet.get_cell((2, 2)).unwrap().get_value(), "600");
        assert_eq!(sheet.get_highest_column(), 2);
    }

    #[test]
    fn overwrite_on_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.xlsx");
        seed_ledger(&path);

        let report =
            merge_exam_column(&path, LEDGER_SHEET, "第一次月考", &scores(), true).unwrap();
        assert!(report.updated);
        assert!(!report.created_column);
        assert_eq!(report.column, 2);

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name(LEDGER_SHEET).unwrap();
        assert_eq!(sheet.get_cell((2, 2)).unwrap().get_value(), "615.5");
    }

    #[test]
    fn missing_sheet_is_a_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.xlsx");
        seed_ledger(&path);

        let err =
            merge_exam_column(&path, "别的表", "期中考试", &scores(), false).unwrap_err();
        assert!(matches!(err, LedgerError::SheetMissing(_)));
    }

    #[test]
    fn indicator_normalization() {
        assert_eq!(normalize_indicator(" 数 学\t"), "数学");
        assert_eq!(normalize_indicator("其他"), "其它");
        assert_eq!(normalize_indicator("总分"), "总分");
    }
}
