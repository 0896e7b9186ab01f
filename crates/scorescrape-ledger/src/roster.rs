//! Roster reading.
//!
//! The roster is a hand-maintained sheet, so the header is matched
//! flexibly: several accepted spellings for the name and password
//! columns, a fall-back to "first two columns" when nothing matches, and
//! an optional account column (student id and friends) used for login in
//! place of the display name.

use std::path::Path;

use umya_spreadsheet::Worksheet;

use scorescrape_core::model::Credential;

use crate::batch::cell_text;
use crate::error::LedgerError;

/// Accepted headers for the display-name column.
const NAME_HEADERS: &[&str] = &["姓名", "name", "用户名", "user", "账号", "学号"];

/// Accepted headers for the password column.
const PASSWORD_HEADERS: &[&str] = &["密码", "pass", "password", "pwd"];

/// Login-account candidates, tried in order per row.
const ACCOUNT_HEADERS: &[&str] = &["姓名", "学号", "账号", "考籍号", "准考证号", "用户名"];

/// Read the roster into credentials, skipping rows with a missing name or
/// password.
pub fn read_roster(path: &Path, sheet_name: Option<&str>) -> Result<Vec<Credential>, LedgerError> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| LedgerError::read(path, format!("{e:?}")))?;
    let sheet = match sheet_name {
        Some(name) => book
            .get_sheet_by_name(name)
            .ok_or_else(|| LedgerError::SheetMissing(name.into()))?,
        None => book
            .get_sheet(&0)
            .ok_or_else(|| LedgerError::SheetMissing("Sheet1".into()))?,
    };

    let highest_col = sheet.get_highest_column();
    let highest_row = sheet.get_highest_row();

    let headers: Vec<String> = (1..=highest_col)
        .map(|c| cell_text(sheet, c, 1).trim().to_string())
        .collect();

    let find = |accepted: &[&str]| {
        headers.iter().position(|h| {
            let lower = h.to_lowercase();
            accepted.iter().any(|a| lower == *a)
        })
    };

    let (name_col, pwd_col) = match (find(NAME_HEADERS), find(PASSWORD_HEADERS)) {
        (Some(n), Some(p)) => (n, p),
        // fall back to the first two columns for headerless rosters
        _ if highest_col >= 2 => (0, 1),
        _ => return Err(LedgerError::RosterColumns),
    };

    let account_cols: Vec<usize> = ACCOUNT_HEADERS
        .iter()
        .filter_map(|a| headers.iter().position(|h| h.trim() == *a))
        .collect();

    let mut credentials = Vec::new();
    for row in 2..=highest_row {
        let name = cell_text(sheet, name_col as u32 + 1, row).trim().to_string();
        let password = cell_text(sheet, pwd_col as u32 + 1, row).trim().to_string();
        if name.is_empty() || password.is_empty() {
            continue;
        }
        let account = pick_account(sheet, row, &account_cols, &name);
        credentials.push(Credential {
            name,
            account,
            password,
        });
    }
    Ok(credentials)
}

/// First non-empty account candidate for this row; `None` when it is just
/// the display name again.
fn pick_account(
    sheet: &Worksheet,
    row: u32,
    account_cols: &[usize],
    name: &str,
) -> Option<String> {
    account_cols
        .iter()
        .map(|c| cell_text(sheet, *c as u32 + 1, row).trim().to_string())
        .find(|v| !v.is_empty())
        .filter(|v| v.as_str() != name)
}
