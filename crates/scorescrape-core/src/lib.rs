//! scorescrape-core — Table heuristics, data model, and the scrape engine.
//!
//! This crate holds everything that does not touch the network or the
//! filesystem: the cell/record/batch data model, the score-table candidate
//! scorer, the multi-header table normalizer, the numeric coercion pass,
//! and the sequential scrape engine that drives a [`traits::PortalGateway`]
//! implementation over a roster.

pub mod coerce;
pub mod engine;
pub mod error;
pub mod model;
pub mod page;
pub mod select;
pub mod table;
pub mod traits;
