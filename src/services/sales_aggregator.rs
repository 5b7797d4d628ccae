//! Groups raw sales facts per product, both per order and per calendar month.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{MonthlyTotal, SaleEntry, SalesFact};
use crate::services::calendar::month_start;

/// Sales grouped by product id.
///
/// Both views are sorted ascending and do not depend on the order in which
/// facts were supplied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SalesAggregate {
    orders: BTreeMap<Uuid, Vec<SaleEntry>>,
    monthly: BTreeMap<Uuid, Vec<MonthlyTotal>>,
}

impl SalesAggregate {
    /// Per-order sales for a product, oldest first. Empty when the product never sold.
    pub fn orders_for(&self, product_id: Uuid) -> &[SaleEntry] {
        self.orders.get(&product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Monthly totals for a product, earliest month first.
    pub fn monthly_totals_for(&self, product_id: Uuid) -> &[MonthlyTotal] {
        self.monthly.get(&product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Products with at least one sale, in ascending id order.
    pub fn product_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.orders.keys().copied()
    }

    pub fn total_facts(&self) -> usize {
        self.orders.values().map(Vec::len).sum()
    }
}

/// Groups sales facts by product.
///
/// Rejects facts with a non-positive quantity.
pub fn aggregate_sales(facts: &[SalesFact]) -> Result<SalesAggregate, ServiceError> {
    let mut orders: BTreeMap<Uuid, Vec<SaleEntry>> = BTreeMap::new();

    for fact in facts {
        if fact.quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "sale of product {} in order {} has non-positive quantity {}",
                fact.product_id, fact.order_id, fact.quantity
            )));
        }
        orders
            .entry(fact.product_id)
            .or_default()
            .push(SaleEntry::from(fact));
    }

    let mut monthly = BTreeMap::new();
    for (product_id, entries) in orders.iter_mut() {
        sort_entries(entries);
        monthly.insert(*product_id, monthly_totals(entries));
    }

    Ok(SalesAggregate { orders, monthly })
}

/// Sorts sale entries into a total order: time, then order id, then quantity.
pub fn sort_entries(entries: &mut [SaleEntry]) {
    entries.sort_by(|a, b| {
        a.occurred_at
            .cmp(&b.occurred_at)
            .then_with(|| a.order_id.cmp(&b.order_id))
            .then_with(|| a.quantity.cmp(&b.quantity))
    });
}

/// Sums one product's sales per calendar month, earliest month first.
pub fn monthly_totals(entries: &[SaleEntry]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<_, i64> = BTreeMap::new();
    for entry in entries {
        *totals.entry(month_start(entry.occurred_at)).or_default() += i64::from(entry.quantity);
    }

    totals
        .into_iter()
        .map(|(month, total_quantity)| MonthlyTotal {
            month,
            total_quantity,
        })
        .collect()
}
