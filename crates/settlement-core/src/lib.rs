//! Shared domain types for the settlement report tooling.
//!
//! Holds the transaction and aggregate models, the error type, the CLI
//! settings and the text formatting helpers used by the other crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{LedgerError, Result};
