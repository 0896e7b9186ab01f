//! Mock portal for testing the scrape pipeline without a live site.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use url::Url;

use scorescrape_core::error::PortalError;
use scorescrape_core::model::Credential;
use scorescrape_core::traits::{AuthenticatedSession, Interaction, Page, PortalGateway};

/// A portal gateway serving canned pages.
///
/// Accounts registered with [`MockPortal::with_user`] log in and land on
/// their page; everything else is rejected the way a wrong password would
/// be. Link targets are shared across all sessions.
pub struct MockPortal {
    landings: HashMap<String, String>,
    linked: HashMap<String, String>,
    login_count: AtomicU32,
}

impl MockPortal {
    pub fn new() -> Self {
        Self {
            landings: HashMap::new(),
            linked: HashMap::new(),
            login_count: AtomicU32::new(0),
        }
    }

    /// Register an account and the landing page it sees after login.
    pub fn with_user(mut self, account: &str, landing_html: &str) -> Self {
        self.landings
            .insert(account.to_string(), landing_html.to_string());
        self
    }

    /// Register a page reachable from any landing page by href.
    pub fn with_link(mut self, href: &str, html: &str) -> Self {
        self.linked.insert(href.to_string(), html.to_string());
        self
    }

    /// Number of login attempts made, successful or not.
    pub fn login_count(&self) -> u32 {
        self.login_count.load(Ordering::Relaxed)
    }
}

impl Default for MockPortal {
    fn default() -> Self {
        Self::new()
    }
}

struct MockSession {
    landing: Page,
    linked: HashMap<String, String>,
}

#[async_trait]
impl PortalGateway for MockPortal {
    async fn login(
        &self,
        credential: &Credential,
        _interaction: &dyn Interaction,
    ) -> Result<Box<dyn AuthenticatedSession>, PortalError> {
        self.login_count.fetch_add(1, Ordering::Relaxed);
        let html = self
            .landings
            .get(credential.login_account())
            .ok_or(PortalError::LoginRejected)?;
        Ok(Box::new(MockSession {
            landing: Page::new(
                Url::parse("http://portal.mock/landing").expect("static url"),
                html.clone(),
            ),
            linked: self.linked.clone(),
        }))
    }
}

#[async_trait]
impl AuthenticatedSession for MockSession {
    fn landing(&self) -> &Page {
        &self.landing
    }

    async fn follow(&self, href: &str) -> Result<Page, PortalError> {
        let html = self
            .linked
            .get(href)
            .ok_or_else(|| PortalError::Network(format!("no mock page for {href}")))?;
        Ok(Page::new(
            Url::parse("http://portal.mock/linked").expect("static url"),
            html.clone(),
        ))
    }
}
