//! Output rendering: JSON for machines, aligned plain text for people.

use settlement_core::formatting::{
    format_number, format_percent, format_yen, pad_left, pad_right, truncate_to_width,
};
use settlement_core::models::{LedgerReport, MonthlyAggregate, SkuAggregate};

const DESCRIPTION_WIDTH: usize = 28;

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// One column of a text table.
struct Column {
    header: &'static str,
    width: usize,
    align: Align,
}

const fn column(header: &'static str, width: usize, align: Align) -> Column {
    Column {
        header,
        width,
        align,
    }
}

const SKU_COLUMNS: &[Column] = &[
    column("SKU", 14, Align::Left),
    column("Description", DESCRIPTION_WIDTH, Align::Left),
    column("Qty", 6, Align::Right),
    column("Sales", 13, Align::Right),
    column("Profit", 13, Align::Right),
    column("ASP", 10, Align::Right),
    column("Margin", 8, Align::Right),
    column("Returns", 12, Align::Right),
];

const MONTH_COLUMNS: &[Column] = &[
    column("Month", 8, Align::Left),
    column("Sales", 13, Align::Right),
    column("Profit", 13, Align::Right),
    column("Fees", 12, Align::Right),
    column("Amazon", 12, Align::Right),
    column("FBA", 12, Align::Right),
    column("Other", 12, Align::Right),
    column("Ads", 12, Align::Right),
];

/// Serialize the report as JSON.
pub fn render_json(report: &LedgerReport, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}

/// Render the report as a plain-text document.
pub fn render_table(report: &LedgerReport) -> String {
    let mut out = String::new();

    let s = &report.summary;
    out.push_str("Summary\n");
    push_pair(&mut out, "Total sales", &format_yen(s.total_sales));
    push_pair(&mut out, "Total profit", &format_yen(s.total_profit));
    push_pair(&mut out, "Total orders", &format_number(s.total_orders as f64, 0));
    push_pair(&mut out, "Total fees", &format_yen(s.total_fees));
    out.push('\n');

    let f = &report.fee_breakdown;
    out.push_str("Fee breakdown\n");
    push_pair(&mut out, "Amazon fees", &format_yen(f.amazon_fees));
    push_pair(&mut out, "Advertising", &format_yen(f.advertising_costs));
    push_pair(&mut out, "Returns", &format_yen(f.return_amount));
    push_pair(&mut out, "FBA storage", &format_yen(f.fba_storage_fees));
    push_pair(&mut out, "Other fees", &format_yen(f.other_fees));
    out.push('\n');

    out.push_str(&format!("SKUs ({})\n", report.sku_analysis.len()));
    push_table(
        &mut out,
        SKU_COLUMNS,
        report.sku_analysis.iter().map(sku_cells),
    );
    out.push('\n');

    out.push_str(&format!("Months ({})\n", report.monthly_trends.len()));
    push_table(
        &mut out,
        MONTH_COLUMNS,
        report.monthly_trends.iter().map(month_cells),
    );

    out
}

fn sku_cells(sku: &SkuAggregate) -> Vec<String> {
    vec![
        sku.sku.clone(),
        truncate_to_width(&sku.description, DESCRIPTION_WIDTH),
        format_number(sku.total_quantity as f64, 0),
        format_yen(sku.total_sales),
        format_yen(sku.total_profit),
        format_yen(sku.average_selling_price),
        format_percent(sku.profit_margin, 1),
        format_yen(sku.return_amount),
    ]
}

fn month_cells(month: &MonthlyAggregate) -> Vec<String> {
    vec![
        month.month.clone(),
        format_yen(month.sales),
        format_yen(month.profit),
        format_yen(month.fees),
        format_yen(month.amazon_fees),
        format_yen(month.fba_fees),
        format_yen(month.other_fees),
        format_yen(month.advertising_costs),
    ]
}

fn push_pair(out: &mut String, label: &str, value: &str) {
    out.push_str("  ");
    out.push_str(&pad_right(label, 14));
    out.push_str(&pad_left(value, 16));
    out.push('\n');
}

fn push_table<I>(out: &mut String, columns: &[Column], rows: I)
where
    I: Iterator<Item = Vec<String>>,
{
    let headers: Vec<String> = columns.iter().map(|c| c.header.to_string()).collect();
    push_row(out, columns, &headers);

    let rule_width = columns.iter().map(|c| c.width).sum::<usize>() + 2 * (columns.len() - 1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    let mut empty = true;
    for cells in rows {
        push_row(out, columns, &cells);
        empty = false;
    }
    if empty {
        out.push_str("(none)\n");
    }
}

fn push_row(out: &mut String, columns: &[Column], cells: &[String]) {
    let line: Vec<String> = columns
        .iter()
        .zip(cells)
        .map(|(col, cell)| match col.align {
            Align::Left => pad_right(cell, col.width),
            Align::Right => pad_left(cell, col.width),
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

// ── Tests ─────────────────────────────────────────────────────────────────────
