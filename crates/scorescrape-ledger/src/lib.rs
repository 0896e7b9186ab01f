//! scorescrape-ledger — Spreadsheet artifacts.
//!
//! Reads the credential roster, persists the scraped batch table, merges
//! one student's indicators into the long-lived ledger workbook without
//! disturbing its formatting, and produces the downstream JSON export.

pub mod batch;
pub mod error;
pub mod export;
pub mod merge;
pub mod roster;

pub use error::LedgerError;
pub use merge::{merge_exam_column, MergeReport};
