//! Terminal interaction.
//!
//! The one place where the pipeline blocks on a human. EOF and interrupted
//! input always mean "no", so a piped or aborted run degrades to the safe
//! answer instead of hanging.

use std::io::{self, BufRead, Write};

use scorescrape_core::traits::Interaction;

pub struct TerminalInteraction {
    /// Answer yes to every overwrite prompt without asking.
    pub assume_yes: bool,
}

impl TerminalInteraction {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn read_line() -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Interaction for TerminalInteraction {
    fn prompt_captcha(&self, account: &str) -> Option<String> {
        eprint!("captcha for {account} (empty to skip): ");
        let _ = io::stderr().flush();
        Self::read_line().filter(|s| !s.is_empty())
    }

    fn confirm_overwrite(&self, target: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        loop {
            eprint!("'{target}' already exists. Overwrite? (y/n): ");
            let _ = io::stderr().flush();
            match Self::read_line().as_deref() {
                Some("y") | Some("yes") | Some("是") => return true,
                Some("n") | Some("no") | Some("否") => return false,
                Some(_) => continue,
                None => return false,
            }
        }
    }
}
