//! The `scorescrape scrape` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::Table;

use scorescrape_core::engine::{BatchOutcome, EngineConfig, ProgressReporter, ScrapeEngine};
use scorescrape_core::error::PortalError;
use scorescrape_core::model::RowPick;
use scorescrape_core::traits::Interaction;
use scorescrape_ledger::{batch, roster};
use scorescrape_portal::{PortalClient, ScorescrapeConfig};

/// Console progress reporter.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_user_start(&self, index: usize, total: usize, name: &str) {
        eprintln!("[{index}/{total}] logging in: {name}");
    }

    fn on_user_scraped(&self, name: &str, rows: usize) {
        eprintln!("  scraped: {name} ({rows} row{})", if rows == 1 { "" } else { "s" });
    }

    fn on_user_skipped(&self, name: &str, error: &PortalError) {
        eprintln!("  skipped: {name}: {error}");
    }

    fn on_batch_complete(&self, total: usize, scraped: usize, skipped: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {scraped}/{total} scraped, {skipped} skipped ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

/// Run the scrape and write the batch workbook. Shared with `run`.
pub async fn scrape_batch(
    config: &ScorescrapeConfig,
    roster_path: &std::path::Path,
    output: &std::path::Path,
    interaction: &dyn Interaction,
) -> Result<BatchOutcome> {
    let users = roster::read_roster(roster_path, Some(&config.roster.sheet))
        .with_context(|| format!("failed to read roster {}", roster_path.display()))?;
    anyhow::ensure!(!users.is_empty(), "roster has no usable rows");
    eprintln!("{} roster users loaded", users.len());

    let row_pick: RowPick = config
        .row_pick
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let engine_config = EngineConfig {
        row_pick,
        delay: Duration::from_millis(config.portal.delay_ms),
        site_name_prefixes: config.portal.site_name_prefixes.clone(),
        ..EngineConfig::default()
    };

    let portal = PortalClient::new(config.portal.clone())?;
    let engine = ScrapeEngine::new(Arc::new(portal), engine_config);
    let outcome = engine.run(&users, &ConsoleReporter, interaction).await;

    anyhow::ensure!(
        !outcome.table.is_empty(),
        "no score rows scraped; nothing to write"
    );
    batch::write_batch(output, &outcome.table)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote {} with {} rows.",
        output.display(),
        outcome.table.len()
    );

    if !outcome.skipped.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["skipped user", "reason"]);
        for (name, kind) in &outcome.skipped {
            table.add_row(vec![name.as_str(), kind.as_str()]);
        }
        println!("{table}");
    }

    Ok(outcome)
}

pub async fn execute(
    roster: PathBuf,
    output: Option<PathBuf>,
    row_pick: Option<String>,
    debug_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = scorescrape_portal::load_config_from(config_path.as_deref())?;
    if let Some(mode) = row_pick {
        config.row_pick = mode;
    }
    if debug_dir.is_some() {
        config.portal.debug_dir = debug_dir;
    }
    let output = output.unwrap_or_else(|| config.output.batch_file.clone());

    let interaction = crate::interact::TerminalInteraction::new(false);
    let outcome = scrape_batch(&config, &roster, &output, &interaction).await?;

    match outcome.exam_name {
        Some(name) => println!("Detected exam: {name}"),
        None => println!("No exam name detected; file the workbook manually."),
    }
    Ok(())
}
