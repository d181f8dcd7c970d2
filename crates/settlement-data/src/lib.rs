//! Settlement ledger engine.
//!
//! Reads a marketplace settlement export, tokenizes it, builds typed
//! transactions, classifies each one into postings and folds them into a
//! [`settlement_core::models::LedgerReport`].

pub mod aggregator;
pub mod analysis;
pub mod classifier;
pub mod reader;
pub mod record;
pub mod tokenizer;

pub use settlement_core as core;
