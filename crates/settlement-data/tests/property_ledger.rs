// Property-based tests for ledger aggregation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use settlement_data::aggregator::{aggregate, LedgerAccumulator};
use settlement_data::analysis::analyze_ledger;
use settlement_data::core::models::{Transaction, TransactionType};
use settlement_data::record::build_transactions;
use settlement_data::tokenizer::tokenize_ledger;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const PREAMBLE: &str = "p0\np1\np2\np3\np4\np5\np6\nheader\n";

/// One generated settlement row. Amounts are whole yen so sums are exact
/// regardless of summation order.
#[derive(Debug, Clone)]
struct RowSpec {
    kind: &'static str,
    description: &'static str,
    sku: &'static str,
    month: u32,
    day: u32,
    qty: u32,
    sales: i64,
    fees: i64,
    fba_fees: i64,
    other: i64,
    total: i64,
}

fn arb_kind() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        4 => Just(("注文", "商品")),
        2 => Just(("返金", "返品")),
        1 => Just(("注文外料金", "広告費用")),
        1 => Just(("注文外料金", "月額登録料")),
        1 => Just(("FBA 在庫関連の手数料", "FBA在庫保管手数料")),
        1 => Just(("FBA 在庫関連の手数料", "FBA在庫の返送手数料")),
        1 => Just(("振込み", "")),
    ]
}

fn arb_row() -> impl Strategy<Value = RowSpec> {
    (
        arb_kind(),
        prop::sample::select(vec!["", "A1", "B2", "C3", "D4"]),
        1u32..=12,
        1u32..=28,
        0u32..5,
        -5_000i64..50_000,
        (-3_000i64..=0, -1_000i64..=0, -2_000i64..=0),
        -5_000i64..50_000,
    )
        .prop_map(
            |((kind, description), sku, month, day, qty, sales, (fees, fba_fees, other), total)| {
                RowSpec {
                    kind,
                    description,
                    sku,
                    month,
                    day,
                    qty,
                    sales,
                    fees,
                    fba_fees,
                    other,
                    total,
                }
            },
        )
}

fn render_row(r: &RowSpec) -> String {
    let mut cols: Vec<String> = vec![String::new(); 28];
    cols[0] = format!("2024/{:02}/{:02} 10:00:00 JST", r.month, r.day);
    cols[2] = r.kind.to_string();
    cols[4] = r.sku.to_string();
    cols[5] = r.description.to_string();
    cols[6] = r.qty.to_string();
    cols[13] = r.sales.to_string();
    cols[23] = r.fees.to_string();
    cols[24] = r.fba_fees.to_string();
    cols[26] = r.other.to_string();
    cols[27] = r.total.to_string();
    cols.iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_ledger(rows: &[RowSpec]) -> String {
    rows.iter().fold(PREAMBLE.to_string(), |mut acc, r| {
        acc.push_str(&render_row(r));
        acc.push('\n');
        acc
    })
}

fn transactions(rows: &[RowSpec]) -> Vec<Transaction> {
    build_transactions(&tokenize_ledger(&render_ledger(rows)).rows).transactions
}

fn is_order(tx: &Transaction) -> bool {
    tx.transaction_type == TransactionType::Order
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn summary_sales_match_order_rows(rows in prop::collection::vec(arb_row(), 0..40)) {
        let txs = transactions(&rows);
        let report = aggregate(&txs);

        let order_sales: f64 = txs.iter().filter(|t| is_order(t)).map(|t| t.product_sales).sum();
        let order_count = txs.iter().filter(|t| is_order(t)).count() as u64;
        prop_assert_eq!(report.summary.total_sales, order_sales);
        prop_assert_eq!(report.summary.total_orders, order_count);
    }

    #[test]
    fn sku_sales_cover_orders_with_sku(rows in prop::collection::vec(arb_row(), 0..40)) {
        let txs = transactions(&rows);
        let report = aggregate(&txs);

        let expected: f64 = txs
            .iter()
            .filter(|t| is_order(t) && !t.sku.is_empty())
            .map(|t| t.product_sales)
            .sum();
        let actual: f64 = report.sku_analysis.iter().map(|s| s.total_sales).sum();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn return_amount_is_sum_of_refund_magnitudes(rows in prop::collection::vec(arb_row(), 0..40)) {
        let txs = transactions(&rows);
        let report = aggregate(&txs);

        let expected: f64 = txs
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Refund)
            .map(|t| t.total.abs())
            .sum();
        prop_assert_eq!(report.fee_breakdown.return_amount, expected);
    }

    #[test]
    fn views_are_ordered(rows in prop::collection::vec(arb_row(), 0..40)) {
        let report = aggregate(&transactions(&rows));

        for pair in report.sku_analysis.windows(2) {
            prop_assert!(pair[0].total_sales >= pair[1].total_sales);
        }
        for pair in report.monthly_trends.windows(2) {
            prop_assert!(pair[0].month < pair[1].month);
        }
    }

    #[test]
    fn derived_ratios_are_guarded(rows in prop::collection::vec(arb_row(), 0..40)) {
        let report = aggregate(&transactions(&rows));

        for sku in &report.sku_analysis {
            prop_assert!(sku.average_selling_price.is_finite());
            prop_assert!(sku.profit_margin.is_finite());
            if sku.total_quantity == 0 {
                prop_assert_eq!(sku.average_selling_price, 0.0);
            }
            if sku.total_sales <= 0.0 {
                prop_assert_eq!(sku.profit_margin, 0.0);
            }
        }
    }

    #[test]
    fn report_is_deterministic(rows in prop::collection::vec(arb_row(), 0..40)) {
        let text = render_ledger(&rows);
        prop_assert_eq!(analyze_ledger(&text).report, analyze_ledger(&text).report);
    }

    #[test]
    fn merged_slices_match_sequential_fold(
        rows in prop::collection::vec(arb_row(), 0..40),
        split in 0usize..=40,
    ) {
        let txs = transactions(&rows);
        let split = split.min(txs.len());
        let (head, tail) = txs.split_at(split);

        let whole = aggregate(&txs);
        let merged = LedgerAccumulator::from_transactions(head)
            .merge(LedgerAccumulator::from_transactions(tail))
            .finalize();
        prop_assert_eq!(merged, whole);
    }
}
