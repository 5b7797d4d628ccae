use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rand::{rngs::StdRng, SeedableRng};
use sea_orm::DatabaseConnection;

use inventory_backfill::{
    config::{AppConfig, CatalogConfig},
    db,
    services::catalog_seeder::{persist_catalog, plan_catalog, CatalogPlan},
    services::calendar::DEFAULT_SEASONAL_MULTIPLIERS,
};

/// Fresh in-memory SQLite database with all migrations applied.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
    // Every pooled connection to sqlite::memory: opens its own database
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;

    cfg.auto_migrate = true;

    let pool = db::connect_and_prepare(&cfg)
        .await
        .expect("failed to create test database");
    Arc::new(pool)
}

/// Fixed clock for reproducible runs.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 9, 15, 0).unwrap()
}

pub fn small_catalog() -> CatalogConfig {
    CatalogConfig {
        categories: 2,
        products_per_category: 3,
        suppliers: 2,
        orders_per_month: 6,
        max_order_items: 3,
    }
}

/// Plans and writes a small seeded catalog.
#[allow(dead_code)]
pub async fn seed_catalog(
    db: &DatabaseConnection,
    historical_months: u32,
    seed: u64,
) -> CatalogPlan {
    let plan = plan_catalog(
        &small_catalog(),
        historical_months,
        &DEFAULT_SEASONAL_MULTIPLIERS,
        fixed_now(),
        &mut StdRng::seed_from_u64(seed),
    )
    .expect("catalog plan");
    persist_catalog(db, &plan).await.expect("catalog written");
    plan
}
