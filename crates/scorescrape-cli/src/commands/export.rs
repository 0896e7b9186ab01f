//! The `scorescrape export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use scorescrape_ledger::batch::read_batch;
use scorescrape_ledger::export::{build_export, today, write_export};

use super::merge::resolve_exam_name;

pub fn execute(
    exam_file: PathBuf,
    exam_name: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let exam_name = resolve_exam_name(&exam_file, exam_name)?;
    let table = read_batch(&exam_file)
        .with_context(|| format!("failed to read {}", exam_file.display()))?;

    let export = build_export(&table, &exam_name, &today());
    let output = output.unwrap_or_else(|| {
        exam_file.with_file_name(format!("{exam_name}_import.json"))
    });
    write_export(&output, &export)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} students, {} subjects each).",
        output.display(),
        export.data.len(),
        export.data.first().map(|s| s.subjects.len()).unwrap_or(0)
    );
    Ok(())
}
