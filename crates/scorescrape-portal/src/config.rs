//! Configuration loading.
//!
//! All knobs live in one TOML file with serde defaults, searched in the
//! working directory first and the user config directory second, with a
//! couple of environment-variable overrides for the values that change
//! between machines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Explicit login-field names that override inference when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldOverrides {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub captcha: Option<String>,
}

impl FieldOverrides {
    fn pick(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        Self::pick(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        Self::pick(&self.password)
    }

    pub fn captcha(&self) -> Option<&str> {
        Self::pick(&self.captcha)
    }
}

/// Portal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Login page URL; everything else is resolved against it.
    #[serde(default)]
    pub login_url: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Browser-like User-Agent; the portal rejects obvious bots.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Explicit field names when inference is wrong for this site.
    #[serde(default)]
    pub field_overrides: FieldOverrides,
    /// Ask the operator for a captcha when the login page mentions one.
    #[serde(default)]
    pub captcha_prompt: bool,
    /// Pause between users, milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Dump every fetched page here for postmortems.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
    /// School-name prefixes stripped from the detected exam title.
    #[serde(default)]
    pub site_name_prefixes: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: String::new(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            field_overrides: FieldOverrides::default(),
            captcha_prompt: false,
            delay_ms: default_delay_ms(),
            debug_dir: None,
            site_name_prefixes: Vec::new(),
        }
    }
}

fn default_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9".to_string()
}

fn default_delay_ms() -> u64 {
    800
}

/// Roster workbook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_roster_path")]
    pub path: PathBuf,
    #[serde(default = "default_roster_sheet")]
    pub sheet: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
            sheet: default_roster_sheet(),
        }
    }
}

fn default_roster_path() -> PathBuf {
    PathBuf::from("名单.xlsx")
}

fn default_roster_sheet() -> String {
    "Sheet1".to_string()
}

/// Output artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Batch workbook written after a scrape.
    #[serde(default = "default_batch_file")]
    pub batch_file: PathBuf,
    /// Directory the batch workbook is filed into, named by exam.
    #[serde(default = "default_exams_dir")]
    pub exams_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            batch_file: default_batch_file(),
            exams_dir: default_exams_dir(),
        }
    }
}

fn default_batch_file() -> PathBuf {
    PathBuf::from("汇总成绩.xlsx")
}

fn default_exams_dir() -> PathBuf {
    PathBuf::from("历次成绩")
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    #[serde(default = "default_ledger_sheet")]
    pub sheet: String,
    /// The one student whose indicators are merged into the ledger.
    #[serde(default)]
    pub student: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            sheet: default_ledger_sheet(),
            student: String::new(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("成绩汇总.xlsx")
}

fn default_ledger_sheet() -> String {
    "考试详情".to_string()
}

/// Top-level scorescrape configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScorescrapeConfig {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Row pick mode: "last", "third", or "none".
    #[serde(default = "default_row_pick")]
    pub row_pick: String,
}

fn default_row_pick() -> String {
    "last".to_string()
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `scorescrape.toml` in the current directory
/// 2. `~/.config/scorescrape/config.toml`
///
/// Environment overrides: `SCORESCRAPE_LOGIN_URL`, `SCORESCRAPE_STUDENT`.
pub fn load_config() -> Result<ScorescrapeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScorescrapeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("scorescrape.toml");
        if local.exists() {
            Some(local)
        } else if let Some(dir) = config_dir() {
            let global = dir.join("config.toml");
            global.exists().then_some(global)
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ScorescrapeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ScorescrapeConfig::default(),
    };

    if let Ok(url) = std::env::var("SCORESCRAPE_LOGIN_URL") {
        config.portal.login_url = url;
    }
    if let Ok(student) = std::env::var("SCORESCRAPE_STUDENT") {
        config.ledger.student = student;
    }

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("scorescrape"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ScorescrapeConfig::default();
        assert_eq!(config.portal.timeout_secs, 20);
        assert_eq!(config.portal.delay_ms, 800);
        assert_eq!(config.roster.sheet, "Sheet1");
        assert_eq!(config.ledger.sheet, "考试详情");
        assert_eq!(config.row_pick, "last");
        assert!(!config.portal.captcha_prompt);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
row_pick = "third"

[portal]
login_url = "http://10.1.2.3:8001/xs/cjcx/index.asp"
timeout_secs = 5
captcha_prompt = true
site_name_prefixes = ["市一中"]

[portal.field_overrides]
username = "adminname"
password = "adminpwd"

[ledger]
student = "陈宇"
"#;
        let config: ScorescrapeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.portal.timeout_secs, 5);
        assert_eq!(config.portal.field_overrides.username(), Some("adminname"));
        assert_eq!(config.portal.field_overrides.captcha(), None);
        assert_eq!(config.ledger.student, "陈宇");
        assert_eq!(config.row_pick, "third");
        // untouched sections keep their defaults
        assert_eq!(config.output.exams_dir, PathBuf::from("历次成绩"));
    }

    #[test]
    fn empty_override_counts_as_unset() {
        let overrides = FieldOverrides {
            username: Some(String::new()),
            password: Some("mm".into()),
            captcha: None,
        };
        assert_eq!(overrides.username(), None);
        assert_eq!(overrides.password(), Some("mm"));
    }
}
