//! Downstream JSON export.
//!
//! The web importer consumes one JSON document per exam with the full
//! roster: totals, ranks, and per-subject records. The key layout
//! (camelCase at the top level, snake_case inside student entries) is the
//! importer's contract and is reproduced here verbatim.

use std::path::Path;

use serde::{Deserialize, Serialize};

use scorescrape_core::model::{BatchTable, Cell, NAME_COLUMN};

use crate::error::LedgerError;

/// Columns that are not subjects.
const NON_SUBJECT_COLUMNS: &[&str] = &[
    "姓名", "账号", "学号", "考籍号", "准考证号", "用户名", "密码", "总分", "名次", "班级",
    "年级排名", "班级排名",
];

/// Column-name suffixes that mark derived columns rather than subjects.
const DERIVED_MARKERS: &[&str] = &["排名", "均分"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamExport {
    pub exam_name: String,
    pub exam_date: String,
    pub data: Vec<StudentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentEntry {
    pub student_name: String,
    pub class_name: String,
    pub total_score: f64,
    pub grade_rank: i64,
    pub class_rank: i64,
    pub subjects: Vec<SubjectEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub subject: String,
    pub score: f64,
    pub grade_rank: i64,
    pub class_rank: i64,
    pub class_avg: f64,
}

/// Today's date in the importer's `YYYY-MM-DD` format.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Names of the subject columns in a batch table.
pub fn subject_columns(table: &BatchTable) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|name| {
            !NON_SUBJECT_COLUMNS.contains(&name.as_str())
                && !DERIVED_MARKERS.iter().any(|m| name.contains(m))
        })
        .cloned()
        .collect()
}

fn number_at(table: &BatchTable, row: &[Cell], column: &str) -> f64 {
    table
        .column_index(column)
        .and_then(|idx| row.get(idx))
        .and_then(|cell| match cell {
            Cell::Number(n) => Some(*n),
            Cell::Text(t) => t.trim().parse::<f64>().ok(),
        })
        .unwrap_or(0.0)
}

fn text_at(table: &BatchTable, row: &[Cell], column: &str, default: &str) -> String {
    table
        .column_index(column)
        .and_then(|idx| row.get(idx))
        .map(|cell| cell.to_string())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Build the export document from a batch table.
pub fn build_export(table: &BatchTable, exam_name: &str, exam_date: &str) -> ExamExport {
    let subjects = subject_columns(table);

    let data = table
        .rows
        .iter()
        .map(|row| StudentEntry {
            student_name: text_at(table, row, NAME_COLUMN, ""),
            class_name: text_at(table, row, "班级", "未知"),
            total_score: number_at(table, row, "总分"),
            grade_rank: number_at(table, row, "年级排名") as i64,
            class_rank: number_at(table, row, "班级排名") as i64,
            subjects: subjects
                .iter()
                .map(|subject| SubjectEntry {
                    subject: subject.clone(),
                    score: number_at(table, row, subject),
                    grade_rank: number_at(table, row, &format!("{subject}年级排名")) as i64,
                    class_rank: number_at(table, row, &format!("{subject}班级排名")) as i64,
                    class_avg: number_at(table, row, &format!("{subject}班级均分")),
                })
                .collect(),
        })
        .collect();

    ExamExport {
        exam_name: exam_name.to_string(),
        exam_date: exam_date.to_string(),
        data,
    }
}

/// Serialize the export document to `path` as pretty JSON.
pub fn write_export(path: &Path, export: &ExamExport) -> Result<(), LedgerError> {
    let json = serde_json::to_string_pretty(export)
        .map_err(|e| LedgerError::write(path, e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}
