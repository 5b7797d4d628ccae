mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Datelike;
use rand::{rngs::StdRng, SeedableRng};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use inventory_backfill::{
    config::{GeneratorConfig, NegativeStockPolicy},
    entities::{product, product_history},
    models::ChangeType,
    repositories::SeaOrmInventoryStore,
    services::inventory_backfill::InventoryBackfill,
};

use common::{fixed_now, seed_catalog, setup_db};

fn generator(months: u32) -> GeneratorConfig {
    GeneratorConfig {
        historical_months: months,
        ..GeneratorConfig::default()
    }
}

fn runner(store: Arc<SeaOrmInventoryStore>, config: GeneratorConfig) -> InventoryBackfill {
    InventoryBackfill::new(store.clone(), store.clone(), store, config)
}

#[tokio::test]
async fn backfill_rebuilds_ledgers_ending_at_current_stock() {
    let db = setup_db().await;
    let plan = seed_catalog(&db, 3, 21).await;
    let store = Arc::new(SeaOrmInventoryStore::new(db.clone()));

    let report = runner(store.clone(), generator(3))
        .run(&mut StdRng::seed_from_u64(7), fixed_now())
        .await
        .expect("backfill runs");

    assert!(report.is_clean(), "failures: {:?}", report.failed);
    assert_eq!(report.products_processed, plan.products.len());

    let mut sales_per_product: HashMap<Uuid, usize> = HashMap::new();
    for item in &plan.order_items {
        *sales_per_product.entry(item.product_id).or_default() += 1;
    }

    let mut ledger_rows = 0;
    for product in &plan.products {
        let ledger = store.ledger_for(product.id).await.unwrap();
        ledger_rows += ledger.len();

        for pair in ledger.windows(2) {
            assert_eq!(
                pair[1].quantity_after,
                pair[0].quantity_after + pair[1].change_amount
            );
            assert!(pair[0].created_at <= pair[1].created_at);
        }
        assert_eq!(
            ledger.last().unwrap().quantity_after,
            i64::from(product.quantity)
        );
        assert!(ledger.iter().all(|row| row.quantity_after >= 0));

        let orders = ledger
            .iter()
            .filter(|row| row.change_type == ChangeType::Order)
            .count();
        let restocks = ledger
            .iter()
            .filter(|row| row.change_type == ChangeType::Restock)
            .count();
        assert_eq!(orders, sales_per_product.get(&product.id).copied().unwrap_or(0));
        assert_eq!(restocks, 4);
    }
    assert_eq!(ledger_rows, report.ledger_rows);
}

#[tokio::test]
async fn forecasts_cover_the_next_three_months() {
    let db = setup_db().await;
    let plan = seed_catalog(&db, 3, 5).await;
    let store = Arc::new(SeaOrmInventoryStore::new(db.clone()));

    runner(store.clone(), generator(3))
        .run(&mut StdRng::seed_from_u64(8), fixed_now())
        .await
        .unwrap();

    let sold: std::collections::HashSet<Uuid> =
        plan.order_items.iter().map(|item| item.product_id).collect();

    for product in &plan.products {
        let forecasts = store.forecasts_for(product.id).await.unwrap();
        if !sold.contains(&product.id) {
            assert!(forecasts.is_empty());
            continue;
        }

        let months: Vec<u32> = forecasts.iter().map(|f| f.date.month()).collect();
        assert_eq!(months, vec![7, 8, 9]);
        for row in &forecasts {
            assert!(row.predicted_demand >= 1);
            let confidence = row.confidence_score.unwrap();
            assert!(confidence >= Decimal::from(70) && confidence <= Decimal::from(95));
            assert_eq!(row.model_type.as_deref(), Some("SMA"));
        }
    }
}

#[tokio::test]
async fn rerun_replaces_rows_instead_of_appending() {
    let db = setup_db().await;
    seed_catalog(&db, 2, 33).await;
    let store = Arc::new(SeaOrmInventoryStore::new(db.clone()));
    let backfill = runner(store.clone(), generator(2));

    let first = backfill
        .run(&mut StdRng::seed_from_u64(1), fixed_now())
        .await
        .unwrap();
    let rows_after_first = product_history::Entity::find().count(db.as_ref()).await.unwrap();

    let second = backfill
        .run(&mut StdRng::seed_from_u64(1), fixed_now())
        .await
        .unwrap();
    let rows_after_second = product_history::Entity::find().count(db.as_ref()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(rows_after_first, rows_after_second);
    assert_eq!(rows_after_second as usize, second.ledger_rows);
}

#[tokio::test]
async fn allow_policy_keeps_drawn_restock_amounts() {
    let db = setup_db().await;
    seed_catalog(&db, 2, 44).await;
    let store = Arc::new(SeaOrmInventoryStore::new(db.clone()));
    let config = GeneratorConfig {
        negative_stock: NegativeStockPolicy::Allow,
        ..generator(2)
    };

    runner(store.clone(), config)
        .run(&mut StdRng::seed_from_u64(2), fixed_now())
        .await
        .unwrap();

    let products = product::Entity::find().all(db.as_ref()).await.unwrap();
    for product in products {
        let ledger = store.ledger_for(product.id).await.unwrap();
        for row in ledger.iter().filter(|r| r.change_type == ChangeType::Restock) {
            assert!((10..=100).contains(&row.change_amount));
        }
        assert_eq!(
            ledger.last().unwrap().quantity_after,
            i64::from(product.quantity)
        );
    }
}

#[tokio::test]
async fn single_product_backfill_touches_only_that_product() {
    let db = setup_db().await;
    let plan = seed_catalog(&db, 1, 55).await;
    let store = Arc::new(SeaOrmInventoryStore::new(db.clone()));
    let target = plan.products[0].id;

    let snapshot = runner(store.clone(), generator(1))
        .backfill_product(target, &mut StdRng::seed_from_u64(3), fixed_now())
        .await
        .unwrap();

    assert_eq!(store.ledger_for(target).await.unwrap().len(), snapshot.ledger_rows);
    for other in plan.products.iter().skip(1) {
        assert!(store.ledger_for(other.id).await.unwrap().is_empty());
    }
}
