//! Top-level pipeline: ledger text in, [`LedgerReport`] plus run metadata out.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use settlement_core::error::Result;
use settlement_core::models::LedgerReport;
use tracing::{info, warn};

use crate::aggregator::LedgerAccumulator;
use crate::reader::read_ledger_file;
use crate::record::build_transactions;
use crate::tokenizer::tokenize_ledger;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
///
/// Kept apart from [`LedgerReport`] so the report stays a pure function of
/// the input text.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    /// Lines examined after the preamble and header.
    pub lines_scanned: usize,
    pub blank_lines: usize,
    /// Transactions produced by the record builder.
    pub transactions_parsed: usize,
    /// Rows dropped by the tokenizer or the record builder.
    pub rows_skipped: usize,
    /// Non-empty numeric tokens that were coerced to zero.
    pub defaulted_fields: usize,
    pub sku_count: usize,
    pub month_count: usize,
    /// Wall-clock seconds spent tokenizing and building records.
    pub parse_time_seconds: f64,
    /// Wall-clock seconds spent classifying and aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`analyze_ledger`].
#[derive(Debug, Clone)]
pub struct LedgerAnalysis {
    pub report: LedgerReport,
    pub metadata: AnalysisMetadata,
}

impl LedgerAnalysis {
    /// `true` when no row produced a transaction.
    pub fn is_empty(&self) -> bool {
        self.metadata.transactions_parsed == 0
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over ledger text.
///
/// 1. Tokenize, skipping preamble, header and short rows.
/// 2. Build typed transactions, zeroing unparsable numerics.
/// 3. Fold every transaction into a [`LedgerAccumulator`].
/// 4. Finalize into a sorted [`LedgerReport`].
///
/// An empty ledger is not an error here; callers decide what to do with
/// [`LedgerAnalysis::is_empty`].
pub fn analyze_ledger(text: &str) -> LedgerAnalysis {
    // ── Step 1-2: Parse ───────────────────────────────────────────────────────
    let parse_start = Instant::now();
    let tokenized = tokenize_ledger(text);
    let batch = build_transactions(&tokenized.rows);
    let parse_time = parse_start.elapsed().as_secs_f64();

    info!(
        "Parsed {} transactions from {} lines in {:.3}s",
        batch.transactions.len(),
        tokenized.stats.lines_scanned,
        parse_time
    );

    // ── Step 3-4: Aggregate ───────────────────────────────────────────────────
    let aggregate_start = Instant::now();
    let accumulator = LedgerAccumulator::from_transactions(&batch.transactions);
    let sku_count = accumulator.sku_count();
    let month_count = accumulator.month_count();
    let report = accumulator.finalize();
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!(
        "Aggregated {} SKUs over {} months in {:.3}s",
        sku_count, month_count, aggregate_time
    );

    if batch.transactions.is_empty() {
        warn!("Ledger contains no usable transaction rows");
    }

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        lines_scanned: tokenized.stats.lines_scanned,
        blank_lines: tokenized.stats.blank_lines,
        transactions_parsed: batch.transactions.len(),
        rows_skipped: tokenized.stats.short_rows + batch.skipped.len(),
        defaulted_fields: batch.defaulted_fields,
        sku_count,
        month_count,
        parse_time_seconds: parse_time,
        aggregate_time_seconds: aggregate_time,
    };

    LedgerAnalysis { report, metadata }
}

/// Read `path` (subject to `max_bytes`) and run [`analyze_ledger`] on it.
pub fn analyze_file(path: &Path, max_bytes: u64) -> Result<LedgerAnalysis> {
    let text = read_ledger_file(path, max_bytes)?;
    info!("Analyzing {}", path.display());
    Ok(analyze_ledger(&text))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
