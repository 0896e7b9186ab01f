//! The `scorescrape merge` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use scorescrape_core::traits::Interaction;
use scorescrape_ledger::merge::{extract_student_row, merge_exam_column};

/// Merge one student's row from `exam_file` into the ledger, asking before
/// overwriting an existing exam column. Shared with `run`.
pub fn merge_into_ledger(
    ledger: &Path,
    ledger_sheet: &str,
    exam_file: &Path,
    exam_name: &str,
    student: &str,
    overwrite: bool,
    interaction: &dyn Interaction,
) -> Result<()> {
    anyhow::ensure!(
        !student.is_empty(),
        "no student configured; set [ledger].student or pass --student"
    );

    let scores = extract_student_row(exam_file, student)
        .with_context(|| format!("failed to read {}", exam_file.display()))?;
    println!("Extracted {} indicators for {student}.", scores.len());

    let report = merge_exam_column(ledger, ledger_sheet, exam_name, &scores, overwrite)
        .with_context(|| format!("failed to update {}", ledger.display()))?;

    if !report.updated {
        if !interaction.confirm_overwrite(exam_name) {
            println!("Ledger already has '{exam_name}'; left unchanged.");
            return Ok(());
        }
        let report = merge_exam_column(ledger, ledger_sheet, exam_name, &scores, true)
            .with_context(|| format!("failed to update {}", ledger.display()))?;
        println!(
            "Overwrote column {} ({} indicators matched).",
            report.column, report.matched
        );
        return Ok(());
    }

    println!(
        "{} column {} ({} indicators matched).",
        if report.created_column {
            "Created"
        } else {
            "Updated"
        },
        report.column,
        report.matched
    );
    Ok(())
}

/// Exam name from an explicit flag or the workbook file stem.
pub fn resolve_exam_name(exam_file: &Path, explicit: Option<String>) -> Result<String> {
    match explicit {
        Some(name) if !name.is_empty() => Ok(name),
        _ => exam_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("cannot derive an exam name from {}", exam_file.display())),
    }
}

pub fn execute(
    exam_file: PathBuf,
    exam_name: Option<String>,
    ledger: Option<PathBuf>,
    student: Option<String>,
    overwrite: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = scorescrape_portal::load_config_from(config_path.as_deref())?;
    let ledger = ledger.unwrap_or_else(|| config.ledger.path.clone());
    let student = student.unwrap_or_else(|| config.ledger.student.clone());
    let exam_name = resolve_exam_name(&exam_file, exam_name)?;

    let interaction = crate::interact::TerminalInteraction::new(false);
    merge_into_ledger(
        &ledger,
        &config.ledger.sheet,
        &exam_file,
        &exam_name,
        &student,
        overwrite,
        &interaction,
    )
}
