//! Splits settlement export text into rows of string fields.
//!
//! The export starts with seven lines of free-form preamble and a header
//! line; data rows begin at line index 8. Rows with fewer than
//! [`MIN_COLUMNS`] fields are dropped without a diagnostic.

use tracing::debug;

/// Index of the first data line (0-based).
pub const DATA_START_LINE: usize = 8;

/// Rows shorter than this are structurally invalid and skipped.
pub const MIN_COLUMNS: usize = 26;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data line split into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    /// 0-based line index in the source text.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Counters describing what the tokenizer saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizeStats {
    /// Data lines examined (everything after the header).
    pub lines_scanned: usize,
    pub blank_lines: usize,
    /// Non-blank lines with fewer than [`MIN_COLUMNS`] fields.
    pub short_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLedger {
    pub rows: Vec<TokenRow>,
    pub stats: TokenizeStats,
}

/// Tokenize a whole ledger, preserving row order.
pub fn tokenize_ledger(text: &str) -> TokenizedLedger {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut ledger = TokenizedLedger::default();

    for (line_no, raw) in text.split('\n').enumerate().skip(DATA_START_LINE) {
        ledger.stats.lines_scanned += 1;

        let line = raw.trim();
        if line.is_empty() {
            ledger.stats.blank_lines += 1;
            continue;
        }

        let fields = split_fields(line);
        if fields.len() < MIN_COLUMNS {
            debug!(
                "Dropping line {}: {} fields, need {}",
                line_no,
                fields.len(),
                MIN_COLUMNS
            );
            ledger.stats.short_rows += 1;
            continue;
        }

        ledger.rows.push(TokenRow {
            line: line_no,
            fields,
        });
    }

    ledger
}

/// Split one line on commas, honouring double-quoted sections.
///
/// A quote toggles the quoted state and is not emitted. A quote directly
/// after a backslash is emitted literally and does not toggle.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in line.chars() {
        match c {
            '"' if prev != Some('\\') => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
        prev = Some(c);
    }

    fields.push(current);
    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
