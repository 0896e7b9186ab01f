//! Core data model types for scorescrape.
//!
//! These are the fundamental types the whole system passes around: roster
//! credentials, raw HTML tables, normalized score records, and the batch
//! table that accumulates one row per scraped user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Header of the roster name column, anchored first in every artifact.
pub const NAME_COLUMN: &str = "姓名";

/// One portal user from the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Display name (the roster 姓名 column).
    pub name: String,
    /// Login account when the roster carries a separate 学号/账号 column.
    #[serde(default)]
    pub account: Option<String>,
    /// Portal password.
    pub password: String,
}

impl Credential {
    /// The value submitted in the username field: the dedicated account
    /// column when present, the display name otherwise.
    pub fn login_account(&self) -> &str {
        self.account.as_deref().unwrap_or(&self.name)
    }
}

/// A single spreadsheet-ish cell value.
///
/// Records start as all-text and the coercion pass promotes whole columns
/// to `Number`; serialization is untagged so JSON artifacts carry plain
/// numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Text(t) if t.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers print without a trailing ".0" so ledger and
            // export output match what the portal showed.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(t) => write!(f, "{t}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// An HTML `<table>` reduced to rows of cell text, colspans already
/// expanded. Rows may still be ragged until normalization pads them.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Widest row, which becomes the rectangular column count.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A rectangular record with exactly one header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ScoreRecord {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Force the name column to `value` on every row, inserting the column
    /// at the front when absent, then anchor it first.
    pub fn force_name_column(&mut self, value: &str) {
        match self.column_index(NAME_COLUMN) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = Cell::Text(value.to_string());
                }
                self.move_column_first(idx);
            }
            None => {
                self.columns.insert(0, NAME_COLUMN.to_string());
                for row in &mut self.rows {
                    row.insert(0, Cell::Text(value.to_string()));
                }
            }
        }
    }

    fn move_column_first(&mut self, idx: usize) {
        if idx == 0 {
            return;
        }
        let col = self.columns.remove(idx);
        self.columns.insert(0, col);
        for row in &mut self.rows {
            let cell = row.remove(idx);
            row.insert(0, cell);
        }
    }
}

/// Which data row represents a user's final scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPick {
    /// Final row, where the portal puts the settled scores.
    Last,
    /// Third row, skipping two preamble rows; falls back to the last row.
    Third,
    /// No filtering; keep every row.
    None,
}

impl fmt::Display for RowPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowPick::Last => write!(f, "last"),
            RowPick::Third => write!(f, "third"),
            RowPick::None => write!(f, "none"),
        }
    }
}

impl FromStr for RowPick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last" => Ok(RowPick::Last),
            "third" => Ok(RowPick::Third),
            "none" => Ok(RowPick::None),
            other => Err(format!("unknown row pick mode: {other}")),
        }
    }
}

/// The batch table: every scraped user's rows concatenated, columns aligned
/// by header name (new columns append, earlier rows backfill empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl BatchTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a record's rows, aligning values by column name.
    pub fn push_record(&mut self, record: &ScoreRecord) {
        for name in &record.columns {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
                for row in &mut self.rows {
                    row.push(Cell::empty());
                }
            }
        }
        for rec_row in &record.rows {
            let mut row = vec![Cell::empty(); self.columns.len()];
            for (i, name) in record.columns.iter().enumerate() {
                if let Some(j) = self.column_index(name) {
                    if let Some(cell) = rec_row.get(i) {
                        row[j] = cell.clone();
                    }
                }
            }
            self.rows.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pick_display_and_parse() {
        assert_eq!(RowPick::Last.to_string(), "last");
        assert_eq!("third".parse::<RowPick>().unwrap(), RowPick::Third);
        assert_eq!("NONE".parse::<RowPick>().unwrap(), RowPick::None);
        assert!("second".parse::<RowPick>().is_err());
    }

    #[test]
    fn cell_display_trims_whole_numbers() {
        assert_eq!(Cell::Number(720.0).to_string(), "720");
        assert_eq!(Cell::Number(95.5).to_string(), "95.5");
        assert_eq!(Cell::Text("缺考".into()).to_string(), "缺考");
    }

    #[test]
    fn credential_login_account_falls_back_to_name() {
        let with_account = Credential {
            name: "陈宇".into(),
            account: Some("s20230101".into()),
            password: "pw".into(),
        };
        assert_eq!(with_account.login_account(), "s20230101");

        let name_only = Credential {
            name: "陈宇".into(),
            account: None,
            password: "pw".into(),
        };
        assert_eq!(name_only.login_account(), "陈宇");
    }

    #[test]
    fn force_name_column_inserts_and_anchors() {
        let mut record = ScoreRecord {
            columns: vec!["语文".into(), "姓名".into()],
            rows: vec![vec![Cell::Number(101.0), Cell::Text("xx".into())]],
        };
        record.force_name_column("陈宇");
        assert_eq!(record.columns, vec!["姓名", "语文"]);
        assert_eq!(record.rows[0][0], Cell::Text("陈宇".into()));

        let mut missing = ScoreRecord {
            columns: vec!["语文".into()],
            rows: vec![vec![Cell::Number(101.0)]],
        };
        missing.force_name_column("陈宇");
        assert_eq!(missing.columns, vec!["姓名", "语文"]);
        assert_eq!(missing.rows[0].len(), 2);
    }

    #[test]
    fn batch_aligns_by_column_name() {
        let mut batch = BatchTable::default();
        batch.push_record(&ScoreRecord {
            columns: vec!["姓名".into(), "语文".into()],
            rows: vec![vec![Cell::Text("甲".into()), Cell::Number(100.0)]],
        });
        batch.push_record(&ScoreRecord {
            columns: vec!["姓名".into(), "数学".into()],
            rows: vec![vec![Cell::Text("乙".into()), Cell::Number(120.0)]],
        });

        assert_eq!(batch.columns, vec!["姓名", "语文", "数学"]);
        assert_eq!(batch.rows.len(), 2);
        // First row backfilled with an empty 数学 cell.
        assert!(batch.rows[0][2].is_empty());
        // Second row has no 语文 value.
        assert!(batch.rows[1][1].is_empty());
        assert_eq!(batch.rows[1][2], Cell::Number(120.0));
    }

    #[test]
    fn cell_serde_untagged() {
        let json = serde_json::to_string(&vec![Cell::Number(95.5), Cell::Text("缺考".into())])
            .unwrap();
        assert_eq!(json, r#"[95.5,"缺考"]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], Cell::Number(95.5));
    }
}
