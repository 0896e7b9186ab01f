//! The `scorescrape run` command: the full pipeline in one go.
//!
//! Scrape the roster, file the batch workbook into the exams directory
//! under the detected exam name, merge the configured student into the
//! ledger, and emit the importer JSON. Each step only runs when the
//! previous one produced what it needs; a merge failure does not undo the
//! already-filed workbook.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use scorescrape_core::traits::Interaction;

use super::{export, merge, scrape};
use crate::interact::TerminalInteraction;

pub async fn execute(yes: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = scorescrape_portal::load_config_from(config_path.as_deref())?;
    let interaction = TerminalInteraction::new(yes);

    println!("[1/4] scraping roster...");
    let outcome = scrape::scrape_batch(
        &config,
        &config.roster.path,
        &config.output.batch_file,
        &interaction,
    )
    .await?;

    let Some(exam_name) = outcome.exam_name else {
        println!(
            "No exam name detected; stopping after the batch workbook ({}).",
            config.output.batch_file.display()
        );
        return Ok(());
    };

    println!("[2/4] filing exam workbook...");
    let Some(filed) = file_exam_workbook(
        &config.output.batch_file,
        &config.output.exams_dir,
        &exam_name,
        &interaction,
    )?
    else {
        println!("Filing declined; batch workbook left in place.");
        return Ok(());
    };
    println!("Filed as {}.", filed.display());

    println!("[3/4] merging ledger...");
    if let Err(e) = merge::merge_into_ledger(
        &config.ledger.path,
        &config.ledger.sheet,
        &filed,
        &exam_name,
        &config.ledger.student,
        false,
        &interaction,
    ) {
        // The filed workbook is intact; the merge can be retried alone.
        eprintln!("ledger merge failed: {e:#}");
    }

    println!("[4/4] exporting importer JSON...");
    export::execute(filed, Some(exam_name), None)?;

    println!("\nDone.");
    Ok(())
}

/// Move the batch workbook to `<exams_dir>/<exam>.xlsx`, confirming before
/// replacing an existing file. Returns `None` when the operator declines.
fn file_exam_workbook(
    batch_file: &Path,
    exams_dir: &Path,
    exam_name: &str,
    interaction: &dyn Interaction,
) -> Result<Option<PathBuf>> {
    std::fs::create_dir_all(exams_dir)
        .with_context(|| format!("failed to create {}", exams_dir.display()))?;
    let target = exams_dir.join(format!("{exam_name}.xlsx"));

    if target.exists() && !interaction.confirm_overwrite(&target.display().to_string()) {
        return Ok(None);
    }

    // rename fails across filesystems; fall back to copy + remove
    if std::fs::rename(batch_file, &target).is_err() {
        std::fs::copy(batch_file, &target)
            .with_context(|| format!("failed to copy into {}", target.display()))?;
        std::fs::remove_file(batch_file)?;
    }
    Ok(Some(target))
}
