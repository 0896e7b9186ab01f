//! scorescrape-portal — Portal login and page fetching.
//!
//! Implements the [`scorescrape_core::traits::PortalGateway`] seam over
//! reqwest: login-form field inference, the GB18030 form handshake,
//! success classification, and per-user session scoping.

pub mod codec;
pub mod config;
pub mod fields;
pub mod mock;
pub mod session;

pub use config::{load_config, load_config_from, FieldOverrides, PortalConfig, ScorescrapeConfig};
pub use fields::{infer_form, FormDescriptor, FormMethod};
pub use scorescrape_core::error::PortalError;
pub use session::PortalClient;
