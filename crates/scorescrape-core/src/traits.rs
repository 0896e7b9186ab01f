//! Core trait definitions for the portal gateway and operator interaction.
//!
//! The async gateway traits are implemented by `scorescrape-portal`; the
//! engine only ever sees these seams, which keeps it testable against
//! canned pages.

use async_trait::async_trait;
use url::Url;

use crate::error::PortalError;
use crate::model::Credential;

/// A fetched portal page: final URL (after redirects) plus decoded HTML.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

impl Page {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }
}

/// Entry point to the portal. One call to [`PortalGateway::login`] performs
/// the full handshake for one user on a fresh session; the returned
/// [`AuthenticatedSession`] keeps that user's cookies alive for follow-up
/// fetches and is dropped before the next user starts.
#[async_trait]
pub trait PortalGateway: Send + Sync {
    async fn login(
        &self,
        credential: &Credential,
        interaction: &dyn Interaction,
    ) -> Result<Box<dyn AuthenticatedSession>, PortalError>;
}

/// A logged-in portal session scoped to a single user.
#[async_trait]
pub trait AuthenticatedSession: Send + Sync {
    /// The page the portal landed on right after login.
    fn landing(&self) -> &Page;

    /// Fetch a link relative to the landing page, same cookies.
    async fn follow(&self, href: &str) -> Result<Page, PortalError>;
}

/// Operator interaction capability.
///
/// The scrape loop itself stays synchronous and replayable; anything that
/// would block on a human (captcha entry, overwrite confirmation) goes
/// through this trait so tests and headless runs can script the answers.
pub trait Interaction: Send + Sync {
    /// Ask the operator for a captcha value; `None` means "none entered".
    fn prompt_captcha(&self, account: &str) -> Option<String>;

    /// Ask whether an existing target (exam column, output file) may be
    /// overwritten.
    fn confirm_overwrite(&self, target: &str) -> bool;
}

/// Interaction that never answers: no captcha, never overwrite.
pub struct NonInteractive;

impl Interaction for NonInteractive {
    fn prompt_captcha(&self, _account: &str) -> Option<String> {
        None
    }

    fn confirm_overwrite(&self, _target: &str) -> bool {
        false
    }
}
