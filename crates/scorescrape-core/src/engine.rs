//! Sequential scrape orchestrator.
//!
//! Drives one roster user at a time through login, table selection,
//! normalization, and coercion, accumulating the batch table. Every
//! per-user failure is contained: it is logged, reported, counted, and the
//! loop moves on to the next user. Nothing here is parallel; the fragile
//! legacy host gets one user at a time with a fixed pause in between.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::coerce;
use crate::error::{FailureKind, PortalError};
use crate::model::{BatchTable, Credential, RowPick, ScoreRecord};
use crate::page;
use crate::select;
use crate::table;
use crate::traits::{Interaction, PortalGateway};

/// Configuration for the scrape engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Which row of a normalized record represents the user.
    pub row_pick: RowPick,
    /// Pause between users.
    pub delay: Duration,
    /// Column-coercion ratio threshold.
    pub coerce_threshold: f64,
    /// Columns never coerced to numbers (names and id-like fields).
    pub exclude_columns: Vec<String>,
    /// Site-name prefixes stripped from the extracted exam title.
    pub site_name_prefixes: Vec<String>,
    /// Keep the final two rows for the first scraped user so the batch
    /// retains the portal's duplicated header band.
    pub keep_first_user_headers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            row_pick: RowPick::Last,
            delay: Duration::from_millis(800),
            coerce_threshold: coerce::DEFAULT_THRESHOLD,
            exclude_columns: default_exclude_columns(),
            site_name_prefixes: Vec::new(),
            keep_first_user_headers: true,
        }
    }
}

/// Name/id-like columns that must stay text.
pub fn default_exclude_columns() -> Vec<String> {
    ["姓名", "学号", "账号", "准考证号", "考籍号", "用户名"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_user_start(&self, index: usize, total: usize, name: &str);
    fn on_user_scraped(&self, name: &str, rows: usize);
    fn on_user_skipped(&self, name: &str, error: &PortalError);
    fn on_batch_complete(&self, total: usize, scraped: usize, skipped: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_user_start(&self, _: usize, _: usize, _: &str) {}
    fn on_user_scraped(&self, _: &str, _: usize) {}
    fn on_user_skipped(&self, _: &str, _: &PortalError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Accumulated rows, one per user (two for the first).
    pub table: BatchTable,
    /// Exam title detected on the first successful landing page.
    pub exam_name: Option<String>,
    pub attempted: usize,
    pub scraped: usize,
    /// Users dropped from the batch, with the failure class.
    pub skipped: Vec<(String, FailureKind)>,
}

/// The sequential scrape engine.
pub struct ScrapeEngine {
    portal: Arc<dyn PortalGateway>,
    config: EngineConfig,
}

impl ScrapeEngine {
    pub fn new(portal: Arc<dyn PortalGateway>, config: EngineConfig) -> Self {
        Self { portal, config }
    }

    /// Scrape every roster user in order and accumulate the batch table.
    pub async fn run(
        &self,
        roster: &[Credential],
        progress: &dyn ProgressReporter,
        interaction: &dyn Interaction,
    ) -> BatchOutcome {
        let start = Instant::now();
        let mut outcome = BatchOutcome {
            table: BatchTable::default(),
            exam_name: None,
            attempted: 0,
            scraped: 0,
            skipped: Vec::new(),
        };

        for (idx, credential) in roster.iter().enumerate() {
            outcome.attempted += 1;
            progress.on_user_start(idx + 1, roster.len(), &credential.name);

            match self.scrape_user(credential, interaction).await {
                Ok((record, landing_html)) => {
                    if outcome.exam_name.is_none() {
                        outcome.exam_name =
                            page::extract_exam_name(&landing_html, &self.config.site_name_prefixes);
                        if let Some(name) = &outcome.exam_name {
                            tracing::info!("detected exam name: {name}");
                        }
                    }

                    let first_success = outcome.scraped == 0;
                    let mut picked = if first_success
                        && self.config.keep_first_user_headers
                        && record.rows.len() >= 2
                    {
                        table::keep_last(&record, 2)
                    } else {
                        table::pick_rows(&record, self.config.row_pick)
                    };

                    coerce::coerce_numeric(
                        &mut picked,
                        &self.config.exclude_columns,
                        self.config.coerce_threshold,
                    );
                    picked.force_name_column(&credential.name);

                    let rows = picked.rows.len();
                    outcome.table.push_record(&picked);
                    outcome.scraped += 1;
                    progress.on_user_scraped(&credential.name, rows);
                }
                Err(e) => {
                    tracing::warn!(user = %credential.name, "scrape skipped: {e}");
                    progress.on_user_skipped(&credential.name, &e);
                    outcome.skipped.push((credential.name.clone(), e.kind()));
                }
            }

            if idx + 1 < roster.len() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        progress.on_batch_complete(
            outcome.attempted,
            outcome.scraped,
            outcome.skipped.len(),
            start.elapsed(),
        );
        outcome
    }

    /// Log one user in and pull a normalized record off the landing page,
    /// following a single fallback link when the landing page has no table.
    async fn scrape_user(
        &self,
        credential: &Credential,
        interaction: &dyn Interaction,
    ) -> Result<(ScoreRecord, String), PortalError> {
        let session = self.portal.login(credential, interaction).await?;
        let landing_html = session.landing().html.clone();

        let mut record = extract_record(&landing_html);
        if record.is_none() {
            if let Some(href) = page::first_link(&landing_html) {
                match session.follow(&href).await {
                    Ok(linked) => record = extract_record(&linked.html),
                    Err(e) => tracing::debug!("fallback link fetch failed: {e}"),
                }
            }
        }

        let record = record.ok_or(PortalError::NoScoreTable)?;
        Ok((record, landing_html))
    }
}

fn extract_record(html: &str) -> Option<ScoreRecord> {
    let raw = select::select_best_table(html)?;
    let record = table::normalize(&raw);
    (!record.rows.is_empty()).then_some(record)
}
