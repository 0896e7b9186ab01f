//! Portal error types.
//!
//! These errors cover everything that can go wrong while logging in and
//! extracting a score table for a single roster user. Defined here so the
//! scrape engine can classify failures for batch reporting without string
//! matching.

use thiserror::Error;

/// Errors raised while authenticating against the portal or extracting a
/// score table from an authenticated page.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The login form's username/password fields could not be inferred and
    /// no override was configured.
    #[error("login form fields could not be inferred: {0}")]
    FieldInference(String),

    /// The post-login page still carries a password input.
    #[error("login rejected: response still shows a password prompt")]
    LoginRejected,

    /// No table on the authenticated page (or its fallback link) scored as
    /// a plausible score grid.
    #[error("no score table found on any reachable page")]
    NoScoreTable,

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The portal answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
}

/// Coarse failure classification used in batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Authentication,
    Extraction,
    Network,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Authentication => "authentication",
            FailureKind::Extraction => "extraction",
            FailureKind::Network => "network",
        }
    }
}

impl PortalError {
    /// Classify this error for the batch report.
    pub fn kind(&self) -> FailureKind {
        match self {
            PortalError::FieldInference(_) => FailureKind::Configuration,
            PortalError::LoginRejected => FailureKind::Authentication,
            PortalError::NoScoreTable => FailureKind::Extraction,
            PortalError::Timeout(_) | PortalError::Network(_) | PortalError::Http { .. } => {
                FailureKind::Network
            }
        }
    }
}
