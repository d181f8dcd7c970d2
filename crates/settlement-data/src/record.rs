//! Positional mapping of token rows onto typed [`Transaction`] records.
//!
//! Coercion never fails: unparsable quantities and amounts become zero.
//! That is a known, deliberate data-loss path, so the builder counts every
//! non-empty token it had to zero out.

use settlement_core::models::{Transaction, TransactionType};
use thiserror::Error;
use tracing::{debug, warn};

use crate::tokenizer::{TokenRow, MIN_COLUMNS};

/// Column positions in the settlement export.
mod col {
    pub const DATE: usize = 0;
    pub const PAYMENT_ID: usize = 1;
    pub const TRANSACTION_TYPE: usize = 2;
    pub const ORDER_ID: usize = 3;
    pub const SKU: usize = 4;
    pub const DESCRIPTION: usize = 5;
    pub const QUANTITY: usize = 6;
    pub const AMAZON_SERVICE: usize = 7;
    pub const FULFILLMENT: usize = 8;
    pub const CITY: usize = 9;
    pub const PREFECTURE: usize = 10;
    pub const POSTAL_CODE: usize = 11;
    pub const TAX_COLLECTION_TYPE: usize = 12;
    pub const PRODUCT_SALES: usize = 13;
    pub const PRODUCT_TAX: usize = 14;
    pub const SHIPPING_FEE: usize = 15;
    pub const SHIPPING_TAX: usize = 16;
    pub const GIFT_WRAPPING_FEE: usize = 17;
    pub const GIFT_WRAPPING_TAX: usize = 18;
    pub const AMAZON_POINTS_COST: usize = 19;
    pub const PROMOTION_DISCOUNT: usize = 20;
    pub const PROMOTION_DISCOUNT_TAX: usize = 21;
    pub const MARKETPLACE_TAX: usize = 22;
    pub const FEES: usize = 23;
    pub const FBA_FEES: usize = 24;
    pub const OTHER_TRANSACTION_FEES: usize = 25;
    pub const OTHER: usize = 26;
    pub const TOTAL: usize = 27;
}

/// Why a row did not become a transaction.
///
/// [`tokenize_ledger`](crate::tokenizer::tokenize_ledger) already drops rows
/// shorter than [`MIN_COLUMNS`], so rows coming from the tokenizer never hit
/// this. It guards callers that build [`TokenRow`]s themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("row has {found} fields, need at least {}", MIN_COLUMNS)]
    TooFewColumns { found: usize },
}

/// Result of building every row of a ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub transactions: Vec<Transaction>,
    /// `(line, reason)` for each skipped row, in ledger order. Empty for
    /// rows produced by the tokenizer.
    pub skipped: Vec<(usize, SkipReason)>,
    /// Non-empty numeric tokens that could not be parsed and were zeroed.
    pub defaulted_fields: usize,
}

/// Build transactions for all rows, skipping (and recording) bad ones.
pub fn build_transactions(rows: &[TokenRow]) -> RecordBatch {
    let mut batch = RecordBatch::default();

    for row in rows {
        let mut defaulted = 0usize;
        match build_transaction(row, &mut defaulted) {
            Ok(tx) => batch.transactions.push(tx),
            Err(reason) => {
                debug!("Skipping line {}: {}", row.line, reason);
                batch.skipped.push((row.line, reason));
            }
        }
        batch.defaulted_fields += defaulted;
    }

    if batch.defaulted_fields > 0 {
        warn!(
            "{} numeric fields could not be parsed and were treated as 0",
            batch.defaulted_fields
        );
    }

    batch
}

/// Map one row onto a [`Transaction`].
///
/// `defaulted` is incremented for every non-empty numeric token that was
/// replaced by zero.
pub fn build_transaction(
    row: &TokenRow,
    defaulted: &mut usize,
) -> Result<Transaction, SkipReason> {
    if row.fields.len() < MIN_COLUMNS {
        return Err(SkipReason::TooFewColumns {
            found: row.fields.len(),
        });
    }

    let text = |idx: usize| row.fields.get(idx).cloned().unwrap_or_default();
    let mut amount = |idx: usize| {
        let raw = row.fields.get(idx).map(String::as_str).unwrap_or("");
        let value = parse_amount(raw);
        if value.is_none() && !is_blank_amount(raw) {
            *defaulted += 1;
        }
        value.unwrap_or(0.0)
    };

    let product_sales = amount(col::PRODUCT_SALES);
    let product_tax = amount(col::PRODUCT_TAX);
    let shipping_fee = amount(col::SHIPPING_FEE);
    let shipping_tax = amount(col::SHIPPING_TAX);
    let gift_wrapping_fee = amount(col::GIFT_WRAPPING_FEE);
    let gift_wrapping_tax = amount(col::GIFT_WRAPPING_TAX);
    let amazon_points_cost = amount(col::AMAZON_POINTS_COST);
    let promotion_discount = amount(col::PROMOTION_DISCOUNT);
    let promotion_discount_tax = amount(col::PROMOTION_DISCOUNT_TAX);
    let marketplace_tax = amount(col::MARKETPLACE_TAX);
    let fees = amount(col::FEES);
    let fba_fees = amount(col::FBA_FEES);
    let other_transaction_fees = amount(col::OTHER_TRANSACTION_FEES);
    let other = amount(col::OTHER);
    let total = amount(col::TOTAL);

    let raw_quantity = row.fields.get(col::QUANTITY).map(String::as_str).unwrap_or("");
    let quantity = match parse_quantity(raw_quantity) {
        Some(q) => q,
        None => {
            if !raw_quantity.trim().is_empty() {
                *defaulted += 1;
            }
            0
        }
    };

    Ok(Transaction {
        line: row.line,
        date: text(col::DATE),
        payment_id: text(col::PAYMENT_ID),
        transaction_type: TransactionType::from_label(&text(col::TRANSACTION_TYPE)),
        order_id: text(col::ORDER_ID),
        sku: text(col::SKU),
        description: text(col::DESCRIPTION),
        quantity,
        amazon_service: text(col::AMAZON_SERVICE),
        fulfillment: text(col::FULFILLMENT),
        city: text(col::CITY),
        prefecture: text(col::PREFECTURE),
        postal_code: text(col::POSTAL_CODE),
        tax_collection_type: text(col::TAX_COLLECTION_TYPE),
        product_sales,
        product_tax,
        shipping_fee,
        shipping_tax,
        gift_wrapping_fee,
        gift_wrapping_tax,
        amazon_points_cost,
        promotion_discount,
        promotion_discount_tax,
        marketplace_tax,
        fees,
        fba_fees,
        other_transaction_fees,
        other,
        total,
    })
}

/// Parse the leading number of a monetary token after removing grouping
/// commas and stray quotes (`"1,234"`, `"-318 JPY"`, `"1,000円"`).
///
/// Text after the number is ignored. Returns `None` when the token does not
/// start with a number or the value is not finite.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '"').collect();
    let number = leading_number(cleaned.trim())?;
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`.
fn leading_number(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

/// Parse the leading integer of a quantity token (`"3"`, `" 2 "`, `"4pcs"`).
///
/// Returns `None` when there are no leading digits or the value is negative.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: u64 = digits[..end].parse().ok()?;
    if negative && value > 0 {
        return None;
    }
    Some(value)
}

fn is_blank_amount(raw: &str) -> bool {
    raw.chars().all(|c| c == ',' || c == '"' || c.is_whitespace())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
