//! Decides which aggregate dimensions a transaction touches.
//!
//! Classification is a set of independent rules evaluated per row, not a
//! single dispatch: one row can post to the summary, its SKU and its month
//! at once. Every rule emits [`Posting`]s with the sign policy already
//! applied: summary and monthly postings carry magnitudes, SKU postings
//! carry the raw signed ledger value.

use settlement_core::models::{Transaction, TransactionType};
use tracing::debug;

/// A substring test on the `description` column.
///
/// Needles are matched verbatim; ASCII letters are compared
/// case-insensitively so both `Advertising cost` and `advertising cost`
/// are recognised.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionMarker {
    pub name: &'static str,
    pub needles: &'static [&'static str],
}

impl DescriptionMarker {
    pub fn matches(&self, description: &str) -> bool {
        let folded = description.to_ascii_lowercase();
        let hit = self
            .needles
            .iter()
            .any(|needle| folded.contains(&needle.to_ascii_lowercase()));
        if hit {
            debug!("Description {:?} matched marker '{}'", description, self.name);
        }
        hit
    }
}

/// Out-of-order fees whose description carries this are advertising spend.
pub const ADVERTISING_COST_MARKER: DescriptionMarker = DescriptionMarker {
    name: "advertising cost",
    needles: &["広告費用", "advertising cost"],
};

/// FBA inventory fees carrying this are storage fees; the rest also count
/// as "other fees".
pub const FBA_STORAGE_FEE_MARKER: DescriptionMarker = DescriptionMarker {
    name: "FBA storage fee",
    needles: &["FBA在庫保管手数料", "FBA storage fee"],
};

/// Which aggregate a posting lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Summary,
    /// The row's SKU aggregate. When `create` is false the posting only
    /// applies if the SKU has already been seen.
    Sku { create: bool },
    /// The aggregate for the row's `YYYY/MM`.
    Monthly,
}

/// The running total a posting adds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Sales,
    Profit,
    Orders,
    Quantity,
    SalesCount,
    Fees,
    AmazonFees,
    FbaFees,
    OtherFees,
    AdvertisingCosts,
    ReturnAmount,
    ReturnCount,
    FbaStorageFees,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub target: Target,
    pub measure: Measure,
    pub amount: f64,
}

impl Posting {
    fn new(target: Target, measure: Measure, amount: f64) -> Self {
        Self {
            target,
            measure,
            amount,
        }
    }
}

/// Everything a single transaction contributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub postings: Vec<Posting>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    fn push(&mut self, target: Target, measure: Measure, amount: f64) {
        self.postings.push(Posting::new(target, measure, amount));
    }
}

/// One row of the classification table.
struct Rule {
    applies: fn(&Transaction) -> bool,
    post: fn(&Transaction, &mut Classification),
}

const RULES: &[Rule] = &[
    Rule {
        applies: is_order,
        post: post_order,
    },
    Rule {
        applies: is_refund,
        post: post_refund,
    },
    Rule {
        applies: is_advertising_cost,
        post: post_advertising_cost,
    },
    Rule {
        applies: is_fba_inventory_fee,
        post: post_fba_inventory_fee,
    },
];

/// Run every rule against `tx` and collect the postings of those that match.
pub fn classify(tx: &Transaction) -> Classification {
    let mut out = Classification::default();
    if !tx.transaction_type.is_recognised() {
        debug!(
            "Line {}: transaction type {:?} has no rules",
            tx.line, tx.transaction_type
        );
        return out;
    }
    for rule in RULES {
        if (rule.applies)(tx) {
            (rule.post)(tx, &mut out);
        }
    }
    if tx.sku.is_empty() {
        out.postings
            .retain(|p| !matches!(p.target, Target::Sku { .. }));
    }
    out
}

// ── Predicates ────────────────────────────────────────────────────────────────

fn is_order(tx: &Transaction) -> bool {
    tx.transaction_type == TransactionType::Order
}

fn is_refund(tx: &Transaction) -> bool {
    tx.transaction_type == TransactionType::Refund
}

fn is_advertising_cost(tx: &Transaction) -> bool {
    tx.transaction_type == TransactionType::OutOfOrderFee
        && ADVERTISING_COST_MARKER.matches(&tx.description)
}

fn is_fba_inventory_fee(tx: &Transaction) -> bool {
    tx.transaction_type == TransactionType::FbaInventoryFee
}

// ── Postings ──────────────────────────────────────────────────────────────────

fn post_order(tx: &Transaction, out: &mut Classification) {
    use Measure::*;
    const SKU: Target = Target::Sku { create: true };

    let fee_total = tx.fees.abs() + tx.fba_fees.abs();

    out.push(Target::Summary, Sales, tx.product_sales);
    out.push(Target::Summary, Profit, tx.total);
    out.push(Target::Summary, Orders, 1.0);
    out.push(Target::Summary, Fees, fee_total);
    out.push(Target::Summary, AmazonFees, tx.fees.abs());

    out.push(SKU, Sales, tx.product_sales);
    out.push(SKU, Profit, tx.total);
    out.push(SKU, Quantity, tx.quantity as f64);
    out.push(SKU, SalesCount, 1.0);
    out.push(SKU, AmazonFees, tx.fees);
    out.push(SKU, FbaFees, tx.fba_fees);
    out.push(SKU, OtherFees, tx.other_transaction_fees);

    out.push(Target::Monthly, Sales, tx.product_sales);
    out.push(Target::Monthly, Profit, tx.total);
    out.push(Target::Monthly, Fees, fee_total);
    out.push(Target::Monthly, AmazonFees, tx.fees.abs());
    out.push(Target::Monthly, FbaFees, tx.fba_fees.abs());
    out.push(Target::Monthly, OtherFees, tx.other_transaction_fees.abs());
}

fn post_refund(tx: &Transaction, out: &mut Classification) {
    const SKU: Target = Target::Sku { create: false };

    out.push(Target::Summary, Measure::ReturnAmount, tx.total.abs());
    out.push(SKU, Measure::ReturnAmount, tx.total);
    out.push(SKU, Measure::ReturnCount, 1.0);
    out.push(Target::Monthly, Measure::Profit, tx.total);
}

fn post_advertising_cost(tx: &Transaction, out: &mut Classification) {
    out.push(Target::Summary, Measure::AdvertisingCosts, tx.other.abs());
    out.push(
        Target::Sku { create: true },
        Measure::AdvertisingCosts,
        tx.other,
    );
    out.push(Target::Monthly, Measure::AdvertisingCosts, tx.other.abs());
}

fn post_fba_inventory_fee(tx: &Transaction, out: &mut Classification) {
    out.push(Target::Summary, Measure::FbaStorageFees, tx.other.abs());
    if !FBA_STORAGE_FEE_MARKER.matches(&tx.description) {
        out.push(Target::Summary, Measure::OtherFees, tx.other.abs());
    }
    out.push(
        Target::Sku { create: true },
        Measure::FbaStorageFees,
        tx.other,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: &str, sku: &str, description: &str) -> Transaction {
        Transaction {
            line: 8,
            date: "2024/02/03 12:00:00 JST".to_string(),
            payment_id: String::new(),
            transaction_type: TransactionType::from_label(kind),
            order_id: String::new(),
            sku: sku.to_string(),
            description: description.to_string(),
            quantity: 2,
            amazon_service: String::new(),
            fulfillment: String::new(),
            city: String::new(),
            prefecture: String::new(),
            postal_code: String::new(),
            tax_collection_type: String::new(),
            product_sales: 1000.0,
            product_tax: 100.0,
            shipping_fee: 0.0,
            shipping_tax: 0.0,
            gift_wrapping_fee: 0.0,
            gift_wrapping_tax: 0.0,
            amazon_points_cost: 0.0,
            promotion_discount: 0.0,
            promotion_discount_tax: 0.0,
            marketplace_tax: 0.0,
            fees: -150.0,
            fba_fees: -300.0,
            other_transaction_fees: -20.0,
            other: -500.0,
            total: 530.0,
        }
    }

    fn amount(c: &Classification, target: Target, measure: Measure) -> Option<f64> {
        c.postings
            .iter()
            .find(|p| p.target == target && p.measure == measure)
            .map(|p| p.amount)
    }

    fn touches(c: &Classification, target: Target) -> bool {
        c.postings.iter().any(|p| p.target == target)
    }

    const SKU_NEW: Target = Target::Sku { create: true };
    const SKU_KNOWN: Target = Target::Sku { create: false };

    // ── markers ───────────────────────────────────────────────────────────────

    #[test]
    fn test_advertising_marker() {
        assert!(ADVERTISING_COST_MARKER.matches("広告費用"));
        assert!(ADVERTISING_COST_MARKER.matches("Sponsored Products Advertising Cost"));
        assert!(!ADVERTISING_COST_MARKER.matches("月額登録料"));
    }

    #[test]
    fn test_storage_marker() {
        assert!(FBA_STORAGE_FEE_MARKER.matches("FBA在庫保管手数料"));
        assert!(FBA_STORAGE_FEE_MARKER.matches("fba storage fee (long term)"));
        assert!(!FBA_STORAGE_FEE_MARKER.matches("FBA在庫の返送手数料"));
    }

    // ── Order ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_order_posts_to_all_three_dimensions() {
        let c = classify(&tx("注文", "A1", "ボトル"));

        assert_eq!(amount(&c, Target::Summary, Measure::Sales), Some(1000.0));
        assert_eq!(amount(&c, Target::Summary, Measure::Profit), Some(530.0));
        assert_eq!(amount(&c, Target::Summary, Measure::Orders), Some(1.0));
        assert_eq!(amount(&c, Target::Summary, Measure::Fees), Some(450.0));
        assert_eq!(amount(&c, Target::Summary, Measure::AmazonFees), Some(150.0));

        assert_eq!(amount(&c, SKU_NEW, Measure::Quantity), Some(2.0));
        assert_eq!(amount(&c, SKU_NEW, Measure::SalesCount), Some(1.0));
        assert_eq!(amount(&c, SKU_NEW, Measure::AmazonFees), Some(-150.0));
        assert_eq!(amount(&c, SKU_NEW, Measure::FbaFees), Some(-300.0));
        assert_eq!(amount(&c, SKU_NEW, Measure::OtherFees), Some(-20.0));

        assert_eq!(amount(&c, Target::Monthly, Measure::FbaFees), Some(300.0));
        assert_eq!(amount(&c, Target::Monthly, Measure::OtherFees), Some(20.0));
        assert_eq!(amount(&c, Target::Monthly, Measure::Fees), Some(450.0));
    }

    #[test]
    fn test_order_without_sku_skips_sku_dimension() {
        let c = classify(&tx("Order", "", ""));
        assert!(touches(&c, Target::Summary));
        assert!(touches(&c, Target::Monthly));
        assert!(!touches(&c, SKU_NEW));
    }

    // ── Refund ────────────────────────────────────────────────────────────────

    #[test]
    fn test_refund_sign_asymmetry() {
        let mut refund = tx("返金", "A1", "");
        refund.total = -100.0;
        let c = classify(&refund);

        assert_eq!(
            amount(&c, Target::Summary, Measure::ReturnAmount),
            Some(100.0)
        );
        assert_eq!(amount(&c, SKU_KNOWN, Measure::ReturnAmount), Some(-100.0));
        assert_eq!(amount(&c, SKU_KNOWN, Measure::ReturnCount), Some(1.0));
        assert_eq!(amount(&c, Target::Monthly, Measure::Profit), Some(-100.0));
        assert_eq!(amount(&c, Target::Summary, Measure::Sales), None);
    }

    // ── Out-of-order fee ──────────────────────────────────────────────────────

    #[test]
    fn test_advertising_fee_posts() {
        let c = classify(&tx("注文外料金", "A1", "広告費用"));
        assert_eq!(
            amount(&c, Target::Summary, Measure::AdvertisingCosts),
            Some(500.0)
        );
        assert_eq!(amount(&c, SKU_NEW, Measure::AdvertisingCosts), Some(-500.0));
        assert_eq!(
            amount(&c, Target::Monthly, Measure::AdvertisingCosts),
            Some(500.0)
        );
    }

    #[test]
    fn test_out_of_order_fee_without_marker_is_ignored() {
        let c = classify(&tx("注文外料金", "A1", "月額登録料"));
        assert!(c.is_empty());
    }

    // ── FBA inventory fee ─────────────────────────────────────────────────────

    #[test]
    fn test_fba_storage_fee_is_not_other_fee() {
        let c = classify(&tx("FBA 在庫関連の手数料", "", "FBA在庫保管手数料"));
        assert_eq!(
            amount(&c, Target::Summary, Measure::FbaStorageFees),
            Some(500.0)
        );
        assert_eq!(amount(&c, Target::Summary, Measure::OtherFees), None);
        assert!(!touches(&c, Target::Monthly));
    }

    #[test]
    fn test_fba_non_storage_fee_counts_twice_in_summary() {
        let c = classify(&tx("FBA inventory-related fee", "B2", "FBA在庫の返送手数料"));
        assert_eq!(
            amount(&c, Target::Summary, Measure::FbaStorageFees),
            Some(500.0)
        );
        assert_eq!(amount(&c, Target::Summary, Measure::OtherFees), Some(500.0));
        assert_eq!(amount(&c, SKU_NEW, Measure::FbaStorageFees), Some(-500.0));
    }

    // ── Other ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_unrecognised_type_posts_nothing() {
        assert!(classify(&tx("振込み", "A1", "広告費用")).is_empty());
    }
}
