//! Score-table candidate selection.
//!
//! Authenticated portal pages carry several tables: navigation bands,
//! layout scaffolding, and somewhere among them the dense score grid. The
//! grid is wide (one column per subject plus ranks and averages) and
//! keyword-dense, while the noise tables are narrow or keyword-sparse, so
//! a combined shape/keyword score separates them without per-site
//! hardcoding.

use scraper::{Html, Selector};

use crate::model::RawTable;
use crate::table::parse_table;

/// CSS class the portal has historically put on the dense score grid.
const SCORE_TABLE_CLASS: &str = "a2";

/// A class-matched table must still be wider than this to win the fast path.
const FAST_PATH_MIN_COLUMNS: usize = 20;

/// Tables at or below this width are penalized as navigation chrome.
const NARROW_TABLE_MAX_COLUMNS: usize = 5;

/// How many data rows participate in keyword counting.
const KEYWORD_SCAN_ROWS: usize = 3;

/// Domain terms that show up in score grids but rarely in layout tables.
const KEYWORDS: &[&str] = &[
    "成绩", "分数", "分", "科目", "课程", "总分", "平均分", "名次", "班级", "学号",
];

/// Heuristic candidate score for a parsed table.
///
/// Width dominates (score grids routinely exceed 40 columns), row count
/// breaks ties between similarly wide tables, keyword hits lift grids whose
/// width alone is unconvincing, and narrow tables take a flat penalty that
/// no keyword density can offset against a genuinely wide grid.
pub fn score_table(columns: usize, rows: usize, keyword_hits: usize) -> i64 {
    let mut score = columns as i64 * 100 + rows as i64 + keyword_hits as i64 * 10;
    if columns <= NARROW_TABLE_MAX_COLUMNS {
        score -= 1000;
    }
    score
}

/// Count how many domain keywords appear anywhere in the header and the
/// first few data rows. Each keyword counts once no matter how often it
/// occurs.
pub fn keyword_hits(table: &RawTable) -> usize {
    let blob: String = table
        .rows
        .iter()
        .take(1 + KEYWORD_SCAN_ROWS)
        .flat_map(|row| row.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    KEYWORDS.iter().filter(|k| blob.contains(*k)).count()
}

/// Pick the single most plausible score table on a page, if any.
///
/// Fast path: a table carrying the known grid class with enough columns is
/// selected without scoring the rest. Otherwise every table on the page is
/// parsed and ranked; ties keep the first in document order, so selection
/// is deterministic for a given page.
pub fn select_best_table(html: &str) -> Option<RawTable> {
    let doc = Html::parse_document(html);

    let class_sel =
        Selector::parse(&format!("table.{SCORE_TABLE_CLASS}")).expect("static selector");
    if let Some(el) = doc.select(&class_sel).next() {
        if let Some(table) = parse_table(el) {
            if table.column_count() > FAST_PATH_MIN_COLUMNS {
                return Some(table);
            }
        }
    }

    let table_sel = Selector::parse("table").expect("static selector");
    let mut best: Option<(i64, RawTable)> = None;
    for el in doc.select(&table_sel) {
        let Some(table) = parse_table(el) else {
            continue;
        };
        let score = score_table(table.column_count(), table.rows.len(), keyword_hits(&table));
        if best.as_ref().map_or(true, |(b, _)| score > *b) {
            best = Some((score, table));
        }
    }
    best.map(|(_, t)| t)
}
