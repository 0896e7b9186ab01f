//! The `scorescrape init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("scorescrape.toml").exists() {
        println!("scorescrape.toml already exists, skipping.");
    } else {
        std::fs::write("scorescrape.toml", SAMPLE_CONFIG)?;
        println!("Created scorescrape.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit scorescrape.toml: portal URL, roster path, ledger student");
    println!("  2. Run: scorescrape scrape --roster <roster.xlsx>");
    println!("  3. Run: scorescrape run --yes");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# scorescrape configuration

# Which data row of the normalized table represents a user: last, third, none
row_pick = "last"

[portal]
login_url = "http://10.1.2.3:8001/xs/cjcx/index.asp"
timeout_secs = 20
# Pause between roster users, milliseconds
delay_ms = 800
# Ask for a captcha on the console when the login page mentions one
captcha_prompt = false
# School-name prefixes stripped from the detected exam title
site_name_prefixes = []
# Dump every fetched page for postmortems
# debug_dir = "debug_pages"

# Uncomment when field inference guesses wrong for your deployment:
# [portal.field_overrides]
# username = "adminname"
# password = "adminpwd"

[roster]
path = "名单.xlsx"
sheet = "Sheet1"

[output]
batch_file = "汇总成绩.xlsx"
exams_dir = "历次成绩"

[ledger]
path = "成绩汇总.xlsx"
sheet = "考试详情"
# The one student whose indicators are merged into the ledger
student = ""
"#;
