use serde::{Deserialize, Serialize};

/// The four settlement categories the engine recognises, plus a catch-all
/// for every other label found in the export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// A product sale.
    Order,
    /// Money returned to a customer.
    Refund,
    /// A charge not tied to an order (advertising, subscriptions, ...).
    OutOfOrderFee,
    /// Storage and other inventory charges levied by fulfilment.
    FbaInventoryFee,
    /// Any label outside the table, kept verbatim.
    Other(String),
}

/// Label table used to resolve the `transactionType` column.
///
/// Settlement exports are produced in Japanese; the English glosses are
/// accepted as well so that hand-written fixtures stay readable.
pub const TRANSACTION_TYPE_LABELS: &[(&str, TransactionType)] = &[
    ("注文", TransactionType::Order),
    ("Order", TransactionType::Order),
    ("返金", TransactionType::Refund),
    ("Refund", TransactionType::Refund),
    ("注文外料金", TransactionType::OutOfOrderFee),
    ("Out-of-order fee", TransactionType::OutOfOrderFee),
    ("FBA 在庫関連の手数料", TransactionType::FbaInventoryFee),
    ("FBA inventory-related fee", TransactionType::FbaInventoryFee),
];

impl TransactionType {
    /// Resolve a raw column value by exact match against
    /// [`TRANSACTION_TYPE_LABELS`].
    pub fn from_label(label: &str) -> Self {
        TRANSACTION_TYPE_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| TransactionType::Other(label.to_string()))
    }

    /// `true` for the four categories that drive aggregation.
    pub fn is_recognised(&self) -> bool {
        !matches!(self, TransactionType::Other(_))
    }
}

/// One data row of the settlement export, after coercion.
///
/// Monetary fields are signed: deductions appear as negative numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// 0-based line index in the source text.
    pub line: usize,
    /// Settlement date, `YYYY/MM/DD ...`.
    pub date: String,
    pub payment_id: String,
    pub transaction_type: TransactionType,
    pub order_id: String,
    pub sku: String,
    pub description: String,
    pub quantity: u64,
    pub amazon_service: String,
    pub fulfillment: String,
    pub city: String,
    pub prefecture: String,
    pub postal_code: String,
    pub tax_collection_type: String,
    pub product_sales: f64,
    pub product_tax: f64,
    pub shipping_fee: f64,
    pub shipping_tax: f64,
    pub gift_wrapping_fee: f64,
    pub gift_wrapping_tax: f64,
    pub amazon_points_cost: f64,
    pub promotion_discount: f64,
    pub promotion_discount_tax: f64,
    pub marketplace_tax: f64,
    pub fees: f64,
    pub fba_fees: f64,
    pub other_transaction_fees: f64,
    pub other: f64,
    pub total: f64,
}

impl Transaction {
    /// The `YYYY/MM` month key, or the whole date when it is shorter.
    pub fn month_key(&self) -> &str {
        match self.date.char_indices().nth(7) {
            Some((idx, _)) => &self.date[..idx],
            None => &self.date,
        }
    }
}

// ── Aggregates ────────────────────────────────────────────────────────────────

/// Running totals for one SKU.
///
/// Fee-like fields hold the raw signed ledger values (usually negative),
/// unlike the summary and monthly views which hold magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuAggregate {
    pub sku: String,
    /// Description of the row that first referenced this SKU.
    pub description: String,
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_quantity: u64,
    pub sales_count: u64,
    pub return_amount: f64,
    pub return_count: u64,
    pub amazon_fees: f64,
    pub fba_fees: f64,
    pub advertising_costs: f64,
    pub fba_storage_fees: f64,
    pub other_fees: f64,
    /// Derived at finalization.
    pub average_selling_price: f64,
    /// Derived at finalization, in percent.
    pub profit_margin: f64,
}

impl SkuAggregate {
    pub fn new(sku: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Compute `average_selling_price` and `profit_margin` from the totals.
    pub fn finalize(&mut self) {
        self.average_selling_price = if self.total_quantity > 0 {
            self.total_sales / self.total_quantity as f64
        } else {
            0.0
        };
        self.profit_margin = if self.total_sales > 0.0 {
            self.total_profit / self.total_sales * 100.0
        } else {
            0.0
        };
    }

    /// Add every running total of `other` into `self`.
    pub fn absorb(&mut self, other: &SkuAggregate) {
        self.total_sales += other.total_sales;
        self.total_profit += other.total_profit;
        self.total_quantity += other.total_quantity;
        self.sales_count += other.sales_count;
        self.return_amount += other.return_amount;
        self.return_count += other.return_count;
        self.amazon_fees += other.amazon_fees;
        self.fba_fees += other.fba_fees;
        self.advertising_costs += other.advertising_costs;
        self.fba_storage_fees += other.fba_storage_fees;
        self.other_fees += other.other_fees;
    }
}

/// Totals for one `YYYY/MM` month. Fee-like fields are magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    pub month: String,
    pub sales: f64,
    pub profit: f64,
    pub fees: f64,
    pub amazon_fees: f64,
    pub fba_fees: f64,
    pub other_fees: f64,
    pub advertising_costs: f64,
}

impl MonthlyAggregate {
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            ..Default::default()
        }
    }

    pub fn absorb(&mut self, other: &MonthlyAggregate) {
        self.sales += other.sales;
        self.profit += other.profit;
        self.fees += other.fees;
        self.amazon_fees += other.amazon_fees;
        self.fba_fees += other.fba_fees;
        self.other_fees += other.other_fees;
        self.advertising_costs += other.advertising_costs;
    }
}

/// Headline figures shown on the dashboard's stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_orders: u64,
    pub total_fees: f64,
}

/// Summary-level decomposition of deductions. All values are magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub amazon_fees: f64,
    pub advertising_costs: f64,
    pub return_amount: f64,
    pub fba_storage_fees: f64,
    pub other_fees: f64,
}

/// The single ledger-wide accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalSummary {
    pub summary: Summary,
    pub fee_breakdown: FeeBreakdown,
}

impl GlobalSummary {
    pub fn absorb(&mut self, other: &GlobalSummary) {
        let (s, o) = (&mut self.summary, &other.summary);
        s.total_sales += o.total_sales;
        s.total_profit += o.total_profit;
        s.total_orders += o.total_orders;
        s.total_fees += o.total_fees;

        let (f, o) = (&mut self.fee_breakdown, &other.fee_breakdown);
        f.amazon_fees += o.amazon_fees;
        f.advertising_costs += o.advertising_costs;
        f.return_amount += o.return_amount;
        f.fba_storage_fees += o.fba_storage_fees;
        f.other_fees += o.other_fees;
    }
}

/// The engine's output: three correlated views over one ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    pub summary: Summary,
    /// Sorted by `total_sales` descending.
    pub sku_analysis: Vec<SkuAggregate>,
    /// Sorted by month ascending.
    pub monthly_trends: Vec<MonthlyAggregate>,
    pub fee_breakdown: FeeBreakdown,
}
