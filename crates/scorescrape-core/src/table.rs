//! Raw table parsing and normalization.
//!
//! The portal renders score grids in three observed layouts: a single
//! header row, a sequence-number row above the real header, and headerless
//! tables. [`normalize`] detects which one it is looking at and always
//! produces a rectangular record with exactly one header row.

use scraper::{ElementRef, Selector};

use crate::model::{Cell, RawTable, RowPick, ScoreRecord};

/// Parse a `<table>` element into rows of cell text.
///
/// Colspans are expanded by repeating the cell text so downstream shape
/// heuristics see the visual column count. Returns `None` for tables with
/// no parseable rows.
pub fn parse_table(table: ElementRef<'_>) -> Option<RawTable> {
    let tr = Selector::parse("tr").expect("static selector");
    let td = Selector::parse("td, th").expect("static selector");

    let mut rows = Vec::new();
    for tr_el in table.select(&tr) {
        let mut row = Vec::new();
        for cell in tr_el.select(&td) {
            let text = collapse_ws(cell.text());
            let span = cell
                .value()
                .attr("colspan")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            for _ in 0..span {
                row.push(text.clone());
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        None
    } else {
        Some(RawTable { rows })
    }
}

fn collapse_ws<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw table into a record with a single header row.
///
/// Layout detection, in order:
/// 1. a digits-or-empty first row over a CJK second row is a sequence-number
///    band: the second row is the header, data starts at the third;
/// 2. a first row with at least 3 CJK cells is the header itself;
/// 3. anything else gets synthetic 列1/列2/… names and keeps every row as
///    data.
pub fn normalize(raw: &RawTable) -> ScoreRecord {
    let width = raw.column_count();
    let rows: Vec<Vec<String>> = raw
        .rows
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.resize(width, String::new());
            r
        })
        .collect();

    let (columns, data) = if rows.len() >= 3 && is_sequence_row(&rows[0]) && row_has_cjk(&rows[1])
    {
        (rows[1].clone(), &rows[2..])
    } else if rows.len() >= 2 && cjk_cell_count(&rows[0]) >= 3 {
        (rows[0].clone(), &rows[1..])
    } else {
        let columns: Vec<String> = (1..=width).map(|i| format!("列{i}")).collect();
        (columns, &rows[..])
    };

    ScoreRecord {
        columns,
        rows: data
            .iter()
            .map(|r| r.iter().map(|c| Cell::Text(c.clone())).collect())
            .collect(),
    }
}

/// Select the representative data row(s) per the caller's mode.
pub fn pick_rows(record: &ScoreRecord, mode: RowPick) -> ScoreRecord {
    let rows = match mode {
        RowPick::None => record.rows.clone(),
        RowPick::Last => record.rows.last().cloned().into_iter().collect(),
        RowPick::Third => {
            if record.rows.len() >= 3 {
                vec![record.rows[2].clone()]
            } else {
                record.rows.last().cloned().into_iter().collect()
            }
        }
    };
    ScoreRecord {
        columns: record.columns.clone(),
        rows,
    }
}

/// Keep the final `n` data rows.
pub fn keep_last(record: &ScoreRecord, n: usize) -> ScoreRecord {
    let start = record.rows.len().saturating_sub(n);
    ScoreRecord {
        columns: record.columns.clone(),
        rows: record.rows[start..].to_vec(),
    }
}

fn is_sequence_row(row: &[String]) -> bool {
    row.iter()
        .all(|c| c.is_empty() || c.chars().all(|ch| ch.is_ascii_digit()))
}

fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

fn row_has_cjk(row: &[String]) -> bool {
    row.iter().any(|c| c.chars().any(is_cjk))
}

fn cjk_cell_count(row: &[String]) -> usize {
    row.iter().filter(|c| c.chars().any(is_cjk)).count()
}
