//! Numeric coercion pass.
//!
//! Portal cells arrive as text with assorted decoration: thousands
//! separators, full-width spaces, a trailing 分 unit, dash placeholders.
//! A column is promoted to numbers only when enough of its cells parse,
//! which keeps mixed text columns (a comment field with one stray digit)
//! intact.

use crate::model::{Cell, ScoreRecord};

/// Fraction of cells in a column that must parse before the column is
/// coerced.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Columns with at most this many rows use the lenient single-parse rule,
/// since ratio statistics say nothing about two cells.
const SMALL_SAMPLE_ROWS: usize = 2;

/// Strip decoration that keeps an otherwise numeric cell from parsing.
fn clean_numeric(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\u{3000}' | ',' | ' ' | '分' | '—'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn try_parse(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(t) => {
            let cleaned = clean_numeric(t);
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
    }
}

/// Coerce numeric-looking columns of `record` in place.
///
/// Excluded columns (names, student ids) are never touched. Cells that
/// fail to parse inside a coerced column become empty, mirroring how the
/// batch artifact renders unparseable score cells. Running the pass twice
/// is a no-op.
pub fn coerce_numeric(record: &mut ScoreRecord, exclude: &[String], threshold: f64) {
    let n_rows = record.rows.len();
    if n_rows == 0 {
        return;
    }

    for (idx, name) in record.columns.iter().enumerate() {
        if exclude.iter().any(|e| e == name) {
            continue;
        }

        let parsed: Vec<Option<f64>> = record
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(try_parse))
            .collect();
        let n_ok = parsed.iter().filter(|p| p.is_some()).count();

        let coerce = if n_rows <= SMALL_SAMPLE_ROWS {
            n_ok >= 1
        } else {
            n_ok as f64 / n_rows as f64 >= threshold
        };
        if !coerce {
            continue;
        }

        for (row, value) in record.rows.iter_mut().zip(parsed) {
            if let Some(cell) = row.get_mut(idx) {
                *cell = match value {
                    Some(n) => Cell::Number(n),
                    None => Cell::empty(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(columns: &[&str], rows: Vec<Vec<&str>>) -> ScoreRecord {
        ScoreRecord {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Cell::from).collect())
                .collect(),
        }
    }

    #[test]
    fn unit_suffix_and_separators_are_stripped() {
        assert_eq!(clean_numeric("95.5分"), "95.5");
        assert_eq!(clean_numeric("1,024"), "1024");
        assert_eq!(clean_numeric("\u{3000}88 "), "88");
        assert_eq!(clean_numeric("—"), "");
        assert_eq!(clean_numeric("-3"), "-3");
    }

    #[test]
    fn score_with_unit_coerces() {
        let mut rec = record(&["总分"], vec![vec!["95.5分"]]);
        coerce_numeric(&mut rec, &[], DEFAULT_THRESHOLD);
        assert_eq!(rec.rows[0][0], Cell::Number(95.5));
    }

    #[test]
    fn excluded_columns_stay_text() {
        let mut rec = record(&["学号", "总分"], vec![vec!["20230101", "600"]]);
        coerce_numeric(&mut rec, &["学号".to_string()], DEFAULT_THRESHOLD);
        assert_eq!(rec.rows[0][0], Cell::Text("20230101".into()));
        assert_eq!(rec.rows[0][1], Cell::Number(600.0));
    }

    #[test]
    fn mixed_text_column_below_threshold_is_preserved() {
        let mut rec = record(
            &["备注"],
            vec![vec!["缺考"], vec!["补考"], vec!["病假"], vec!["1"]],
        );
        coerce_numeric(&mut rec, &[], DEFAULT_THRESHOLD);
        assert_eq!(rec.rows[0][0], Cell::Text("缺考".into()));
        assert_eq!(rec.rows[3][0], Cell::Text("1".into()));
    }

    #[test]
    fn majority_numeric_column_coerces_with_gaps() {
        let mut rec = record(
            &["语文"],
            vec![vec!["100"], vec!["90"], vec!["缺考"], vec!["80"], vec!["70"]],
        );
        coerce_numeric(&mut rec, &[], DEFAULT_THRESHOLD);
        assert_eq!(rec.rows[0][0], Cell::Number(100.0));
        // The unparseable cell is blanked, not kept as text.
        assert!(rec.rows[2][0].is_empty());
    }

    #[test]
    fn small_sample_uses_lenient_rule() {
        let mut rec = record(&["总分"], vec![vec!["600"], vec!["缺考"]]);
        coerce_numeric(&mut rec, &[], DEFAULT_THRESHOLD);
        assert_eq!(rec.rows[0][0], Cell::Number(600.0));
        assert!(rec.rows[1][0].is_empty());
    }

    #[test]
    fn coercion_is_idempotent() {
        let mut rec = record(
            &["姓名", "总分", "备注"],
            vec![
                vec!["甲", "600分", "缺考"],
                vec!["乙", "550", "x"],
                vec!["丙", "500", "y"],
            ],
        );
        let exclude = vec!["姓名".to_string()];
        coerce_numeric(&mut rec, &exclude, DEFAULT_THRESHOLD);
        let once = rec.clone();
        coerce_numeric(&mut rec, &exclude, DEFAULT_THRESHOLD);
        assert_eq!(rec, once);
    }
}
