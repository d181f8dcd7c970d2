//! Text formatting helpers for the plain-text report.
//!
//! Amounts in a settlement export are yen, so currency values are shown
//! without a fractional part. Column helpers measure terminal display width
//! rather than `char` count because product names are usually Japanese.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use settlement_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let factor = 10_f64.powi(decimals as i32);
    let rounded = (value.abs() * factor).round() / factor;
    let negative = value < 0.0 && rounded != 0.0;

    let fixed = format!("{:.prec$}", rounded, prec = decimals as usize);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a yen amount, rounded to whole yen.
///
/// ```
/// use settlement_core::formatting::format_yen;
///
/// assert_eq!(format_yen(1234.4), "¥1,234");
/// assert_eq!(format_yen(-980.0), "-¥980");
/// assert_eq!(format_yen(0.0), "¥0");
/// ```
pub fn format_yen(amount: f64) -> String {
    let digits = format_number(amount, 0);
    match digits.strip_prefix('-') {
        Some(abs) => format!("-¥{}", abs),
        None => format!("¥{}", digits),
    }
}

/// Format a percentage that is already scaled to 0–100.
///
/// ```
/// use settlement_core::formatting::format_percent;
///
/// assert_eq!(format_percent(90.0, 1), "90.0%");
/// assert_eq!(format_percent(33.333, 2), "33.33%");
/// ```
pub fn format_percent(value: f64, decimals: u32) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Terminal display width of `s` (East Asian wide characters count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` so it occupies at most `max_width` columns, marking the cut with
/// an ellipsis.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Left-align `s` in a column of `width` display cells.
pub fn pad_right(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(fill))
}

/// Right-align `s` in a column of `width` display cells.
pub fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{}", " ".repeat(fill), s)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
