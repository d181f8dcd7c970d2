//! Folding classified transactions into summary, per-SKU and per-month
//! aggregates, and assembling the final [`LedgerReport`].

use std::collections::{BTreeMap, HashMap};

use settlement_core::models::{
    GlobalSummary, LedgerReport, MonthlyAggregate, SkuAggregate, Transaction,
};

use tracing::debug;

use crate::classifier::{classify, Measure, Posting, Target};

// ── LedgerAccumulator ─────────────────────────────────────────────────────────

/// Accumulator state for one ledger.
///
/// SKUs keep their first-seen order so that the final sort can break ties
/// stably; months live in a `BTreeMap` and come out sorted by key.
///
/// Postings that may only update an existing SKU (refunds) but arrive
/// before that SKU exists are parked in `unmatched`. Within a single fold
/// they are never applied; they only matter when an earlier slice of the
/// ledger is merged in front of this one.
#[derive(Debug, Clone, Default)]
pub struct LedgerAccumulator {
    global: GlobalSummary,
    skus: Vec<SkuAggregate>,
    sku_index: HashMap<String, usize>,
    months: BTreeMap<String, MonthlyAggregate>,
    unmatched: BTreeMap<String, SkuAggregate>,
}

impl LedgerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `transactions` in order into a fresh accumulator.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Self::new(), |mut acc, tx| {
            acc.add_transaction(tx);
            acc
        })
    }

    /// Classify `tx` and apply every posting it produces.
    pub fn add_transaction(&mut self, tx: &Transaction) {
        for posting in classify(tx).postings {
            self.apply(tx, &posting);
        }
    }

    pub fn sku_count(&self) -> usize {
        self.skus.len()
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    /// Combine the accumulator of a ledger slice with the one of the slice
    /// that directly follows it, by per-field summation.
    ///
    /// SKUs from `self` keep their order; SKUs first seen in `other` follow
    /// in `other`'s order. Merging the accumulators of consecutive slices
    /// reproduces the accumulator of the whole ledger.
    pub fn merge(mut self, other: LedgerAccumulator) -> Self {
        self.global.absorb(&other.global);

        // Resolve `other`'s parked postings before its SKUs are added:
        // only SKUs created earlier in the ledger may receive them.
        for (key, parked) in other.unmatched {
            match self.sku_index.get(&key) {
                Some(&idx) => self.skus[idx].absorb(&parked),
                None => self
                    .unmatched
                    .entry(key)
                    .or_insert_with(|| SkuAggregate::new(parked.sku.clone(), ""))
                    .absorb(&parked),
            }
        }

        for sku in other.skus {
            match self.sku_index.get(&sku.sku) {
                Some(&idx) => self.skus[idx].absorb(&sku),
                None => {
                    self.sku_index.insert(sku.sku.clone(), self.skus.len());
                    self.skus.push(sku);
                }
            }
        }

        for (key, month) in other.months {
            self.months
                .entry(key)
                .or_insert_with(|| MonthlyAggregate::new(month.month.clone()))
                .absorb(&month);
        }

        self
    }

    /// Derive ratios, sort, and emit the report.
    pub fn finalize(self) -> LedgerReport {
        if !self.unmatched.is_empty() {
            debug!(
                "{} SKUs had refunds before any order and were left out of the SKU view",
                self.unmatched.len()
            );
        }

        let mut sku_analysis = self.skus;
        for sku in sku_analysis.iter_mut() {
            sku.finalize();
        }
        // `sort_by` is stable: equal sales keep first-seen order.
        sku_analysis.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));

        LedgerReport {
            summary: self.global.summary,
            sku_analysis,
            monthly_trends: self.months.into_values().collect(),
            fee_breakdown: self.global.fee_breakdown,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn apply(&mut self, tx: &Transaction, posting: &Posting) {
        match posting.target {
            Target::Summary => self.apply_summary(posting.measure, posting.amount),
            Target::Sku { create } => match self.sku_entry(tx, create) {
                Some(sku) => apply_sku(sku, posting.measure, posting.amount),
                None if !tx.sku.is_empty() => {
                    let parked = self
                        .unmatched
                        .entry(tx.sku.clone())
                        .or_insert_with(|| SkuAggregate::new(tx.sku.clone(), ""));
                    apply_sku(parked, posting.measure, posting.amount);
                }
                None => {}
            },
            Target::Monthly => {
                let key = tx.month_key();
                let month = self
                    .months
                    .entry(key.to_string())
                    .or_insert_with(|| MonthlyAggregate::new(key));
                apply_monthly(month, posting.measure, posting.amount);
            }
        }
    }

    fn sku_entry(&mut self, tx: &Transaction, create: bool) -> Option<&mut SkuAggregate> {
        if tx.sku.is_empty() {
            return None;
        }
        let idx = match self.sku_index.get(&tx.sku) {
            Some(&idx) => idx,
            None if create => {
                let idx = self.skus.len();
                self.skus
                    .push(SkuAggregate::new(tx.sku.clone(), tx.description.clone()));
                self.sku_index.insert(tx.sku.clone(), idx);
                idx
            }
            None => return None,
        };
        self.skus.get_mut(idx)
    }

    fn apply_summary(&mut self, measure: Measure, amount: f64) {
        let s = &mut self.global.summary;
        let f = &mut self.global.fee_breakdown;
        match measure {
            Measure::Sales => s.total_sales += amount,
            Measure::Profit => s.total_profit += amount,
            Measure::Orders => s.total_orders += amount as u64,
            Measure::Fees => s.total_fees += amount,
            Measure::AmazonFees => f.amazon_fees += amount,
            Measure::AdvertisingCosts => f.advertising_costs += amount,
            Measure::ReturnAmount => f.return_amount += amount,
            Measure::FbaStorageFees => f.fba_storage_fees += amount,
            Measure::OtherFees => f.other_fees += amount,
            Measure::Quantity | Measure::SalesCount | Measure::FbaFees | Measure::ReturnCount => {}
        }
    }
}

fn apply_sku(sku: &mut SkuAggregate, measure: Measure, amount: f64) {
    match measure {
        Measure::Sales => sku.total_sales += amount,
        Measure::Profit => sku.total_profit += amount,
        Measure::Quantity => sku.total_quantity += amount as u64,
        Measure::SalesCount => sku.sales_count += amount as u64,
        Measure::AmazonFees => sku.amazon_fees += amount,
        Measure::FbaFees => sku.fba_fees += amount,
        Measure::OtherFees => sku.other_fees += amount,
        Measure::AdvertisingCosts => sku.advertising_costs += amount,
        Measure::ReturnAmount => sku.return_amount += amount,
        Measure::ReturnCount => sku.return_count += amount as u64,
        Measure::FbaStorageFees => sku.fba_storage_fees += amount,
        Measure::Orders | Measure::Fees => {}
    }
}

fn apply_monthly(month: &mut MonthlyAggregate, measure: Measure, amount: f64) {
    match measure {
        Measure::Sales => month.sales += amount,
        Measure::Profit => month.profit += amount,
        Measure::Fees => month.fees += amount,
        Measure::AmazonFees => month.amazon_fees += amount,
        Measure::FbaFees => month.fba_fees += amount,
        Measure::OtherFees => month.other_fees += amount,
        Measure::AdvertisingCosts => month.advertising_costs += amount,
        Measure::Orders
        | Measure::Quantity
        | Measure::SalesCount
        | Measure::ReturnAmount
        | Measure::ReturnCount
        | Measure::FbaStorageFees => {}
    }
}

/// Fold `transactions` and finalize in one call.
pub fn aggregate(transactions: &[Transaction]) -> LedgerReport {
    LedgerAccumulator::from_transactions(transactions).finalize()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
