//! Demo history synthesizer.
//!
//! Fabricates a plausible day-level stock ledger for a product by walking
//! backward in time from its current on-hand quantity, undoing recorded sales
//! and synthetic monthly restocks. This backfills demo data only; it is not an
//! inventory reconciliation and its restock rows are invented.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::config::{GeneratorConfig, NegativeStockPolicy, MAX_HISTORICAL_MONTHS};
use crate::errors::ServiceError;
use crate::models::{ChangeType, SaleEntry, StockLedgerEntry};
use crate::services::calendar::months_before;

#[derive(Debug, Clone, Copy)]
enum StockEvent {
    Sale { quantity: i64, order_id: Uuid },
    Restock { amount: i64 },
}

/// Reconstructs a product's stock ledger ending at `current_quantity`.
///
/// One `order` row is produced per sale and one `restock` row per calendar
/// month from `now` back `historical_months` months. Rows come back sorted by
/// date ascending and chain exactly: each row's `quantity_after` equals the
/// previous row's plus its own `change_amount`, and the last row ends at
/// `current_quantity`.
///
/// Restock amounts are drawn from `rng` in month order (current month first),
/// so a seeded generator gives reproducible ledgers.
pub fn synthesize_history<R: Rng + ?Sized>(
    product_id: Uuid,
    current_quantity: i64,
    sales: &[SaleEntry],
    config: &GeneratorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<StockLedgerEntry>, ServiceError> {
    if config.negative_stock == NegativeStockPolicy::Clamp && current_quantity < 0 {
        return Err(ServiceError::ValidationError(format!(
            "product {} has negative on-hand quantity {}",
            product_id, current_quantity
        )));
    }
    if config.historical_months > MAX_HISTORICAL_MONTHS {
        return Err(ServiceError::ValidationError(format!(
            "historical_months {} exceeds {}",
            config.historical_months, MAX_HISTORICAL_MONTHS
        )));
    }
    if config.restock_min > config.restock_max {
        return Err(ServiceError::ValidationError(format!(
            "restock range {}..={} is empty",
            config.restock_min, config.restock_max
        )));
    }

    let mut events: Vec<(DateTime<Utc>, StockEvent)> =
        Vec::with_capacity(sales.len() + config.historical_months as usize + 1);

    for sale in sales {
        if sale.quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "order {} has non-positive quantity {}",
                sale.order_id, sale.quantity
            )));
        }
        events.push((
            sale.occurred_at,
            StockEvent::Sale {
                quantity: i64::from(sale.quantity),
                order_id: sale.order_id,
            },
        ));
    }

    for month in 0..=config.historical_months {
        let at = months_before(now, month)?;
        let amount = rng.gen_range(config.restock_min..=config.restock_max);
        events.push((at, StockEvent::Restock { amount }));
    }

    // Newest first; the walk undoes each change to reach the level before it.
    events.sort_by(|a, b| b.0.cmp(&a.0));

    let mut running = current_quantity;
    let mut ledger = Vec::with_capacity(events.len());

    for (at, event) in events {
        let (change_amount, change_type, reference_id) = match event {
            StockEvent::Sale { quantity, order_id } => (-quantity, ChangeType::Order, Some(order_id)),
            StockEvent::Restock { amount } => {
                let amount = match config.negative_stock {
                    NegativeStockPolicy::Clamp => amount.min(running),
                    NegativeStockPolicy::Allow => amount,
                };
                (amount, ChangeType::Restock, None)
            }
        };

        ledger.push(StockLedgerEntry {
            product_id,
            date: at.date_naive(),
            quantity_after: running,
            change_amount,
            change_type,
            reference_id,
            created_at: at,
        });
        running -= change_amount;
    }

    // Emitted newest first; reversing keeps ties in chain order.
    ledger.reverse();

    debug!(
        product_id = %product_id,
        rows = ledger.len(),
        opening_level = running,
        "Synthesized stock history"
    );

    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::replay_forward;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn sale(quantity: i32, at: DateTime<Utc>) -> SaleEntry {
        SaleEntry {
            occurred_at: at,
            quantity,
            order_id: Uuid::new_v4(),
        }
    }

    fn config(months: u32) -> GeneratorConfig {
        GeneratorConfig {
            historical_months: months,
            ..GeneratorConfig::default()
        }
    }

    fn assert_chained(ledger: &[StockLedgerEntry]) {
        for pair in ledger.windows(2) {
            assert_eq!(
                pair[1].quantity_after,
                pair[0].quantity_after + pair[1].change_amount,
                "ledger does not chain at {:?}",
                pair[1]
            );
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn two_sales_two_month_window() {
        let product_id = Uuid::new_v4();
        let sales = vec![
            sale(5, months_before(now(), 2).unwrap() + chrono::Duration::days(3)),
            sale(3, months_before(now(), 1).unwrap() + chrono::Duration::days(3)),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        let ledger =
            synthesize_history(product_id, 50, &sales, &config(2), now(), &mut rng).unwrap();

        let orders: Vec<_> = ledger
            .iter()
            .filter(|r| r.change_type == ChangeType::Order)
            .map(|r| r.change_amount)
            .collect();
        assert_eq!(orders, vec![-5, -3]);
        assert_eq!(
            ledger
                .iter()
                .filter(|r| r.change_type == ChangeType::Restock)
                .count(),
            3
        );
        assert_chained(&ledger);
        assert_eq!(ledger.last().unwrap().quantity_after, 50);
        assert_eq!(replay_forward(&ledger), Some(50));
    }

    #[test]
    fn order_rows_reference_their_orders() {
        let sales = vec![sale(4, now() - chrono::Duration::days(10))];
        let mut rng = StdRng::seed_from_u64(1);
        let ledger =
            synthesize_history(Uuid::new_v4(), 20, &sales, &config(0), now(), &mut rng).unwrap();

        let order_row = ledger
            .iter()
            .find(|r| r.change_type == ChangeType::Order)
            .unwrap();
        assert_eq!(order_row.reference_id, Some(sales[0].order_id));
        assert_eq!(order_row.change_amount, -4);
        assert!(ledger
            .iter()
            .filter(|r| r.change_type == ChangeType::Restock)
            .all(|r| r.reference_id.is_none()));
    }

    #[test]
    fn no_sales_still_emits_restocks() {
        let mut rng = StdRng::seed_from_u64(3);
        let ledger =
            synthesize_history(Uuid::new_v4(), 500, &[], &config(12), now(), &mut rng).unwrap();
        assert_eq!(ledger.len(), 13);
        assert!(ledger.iter().all(|r| r.change_type == ChangeType::Restock));
        assert_eq!(ledger.last().unwrap().date, now().date_naive());
        assert_chained(&ledger);
    }

    #[test]
    fn clamp_keeps_every_level_non_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let ledger =
            synthesize_history(Uuid::new_v4(), 0, &[], &config(12), now(), &mut rng).unwrap();
        assert!(ledger.iter().all(|r| r.quantity_after >= 0));
        assert!(ledger.iter().all(|r| r.quantity_before() >= 0));
        assert_chained(&ledger);
        assert_eq!(replay_forward(&ledger), Some(0));
    }

    #[test]
    fn allow_policy_lets_earlier_levels_go_negative() {
        let cfg = GeneratorConfig {
            negative_stock: NegativeStockPolicy::Allow,
            restock_min: 40,
            restock_max: 40,
            ..config(3)
        };
        let mut rng = StdRng::seed_from_u64(5);
        let ledger = synthesize_history(Uuid::new_v4(), 10, &[], &cfg, now(), &mut rng).unwrap();

        assert_eq!(ledger.first().unwrap().quantity_before(), 10 - 4 * 40);
        assert!(ledger.iter().all(|r| r.change_amount == 40));
        assert_chained(&ledger);
    }

    #[test]
    fn clamp_rejects_negative_on_hand() {
        let mut rng = StdRng::seed_from_u64(5);
        let result = synthesize_history(Uuid::new_v4(), -1, &[], &config(1), now(), &mut rng);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn oversized_history_window_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let result = synthesize_history(Uuid::new_v4(), 10, &[], &config(5_000), now(), &mut rng);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));

        let ledger =
            synthesize_history(Uuid::new_v4(), 10, &[], &config(MAX_HISTORICAL_MONTHS), now(), &mut rng)
                .unwrap();
        assert_eq!(ledger.len(), MAX_HISTORICAL_MONTHS as usize + 1);
    }

    #[test]
    fn same_seed_same_ledger() {
        let product_id = Uuid::new_v4();
        let sales = vec![sale(2, now() - chrono::Duration::days(40))];
        let a = synthesize_history(
            product_id,
            30,
            &sales,
            &config(6),
            now(),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        let b = synthesize_history(
            product_id,
            30,
            &sales,
            &config(6),
            now(),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
