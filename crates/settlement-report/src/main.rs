mod bootstrap;
mod render;

use std::io::Write;

use anyhow::{Context, Result};
use settlement_core::error::{self, LedgerError};
use settlement_core::settings::Settings;
use settlement_data::analysis::analyze_file;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("settlement-report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Ledger: {}, format: {}, limit: {} bytes",
        settings.ledger.display(),
        settings.format,
        settings.max_bytes
    );

    let analysis = analyze_file(&settings.ledger, settings.max_bytes)?;
    if analysis.is_empty() {
        return Err(LedgerError::NoTransactions.into());
    }

    let meta = &analysis.metadata;
    tracing::info!(
        "{} transactions, {} rows skipped, {} fields defaulted, {} SKUs, {} months",
        meta.transactions_parsed,
        meta.rows_skipped,
        meta.defaulted_fields,
        meta.sku_count,
        meta.month_count
    );

    let mut rendered = if settings.is_table() {
        render::render_table(&analysis.report)
    } else {
        render::render_json(&analysis.report, settings.pretty).map_err(LedgerError::from)?
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match &settings.output {
        Some(path) => {
            std::fs::File::create(path)
                .map_err(LedgerError::from)
                .and_then(|file| write_report(file, &rendered))
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => write_report(std::io::stdout().lock(), &rendered)?,
    }

    Ok(())
}

/// Write the rendered report and flush it.
fn write_report<W: Write>(mut out: W, rendered: &str) -> error::Result<()> {
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
