use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{ForecastPoint, MonthlyTotal, SaleEntry, SalesFact, StockLedgerEntry};

pub mod inventory_store;

pub use inventory_store::SeaOrmInventoryStore;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Read access to live product records.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All product ids, ascending.
    async fn list_product_ids(&self) -> Result<Vec<Uuid>, ServiceError>;

    /// On-hand quantity as stored right now.
    async fn current_quantity(&self, product_id: Uuid) -> Result<i64, ServiceError>;
}

/// Read access to recorded sales.
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Every order line joined with its order timestamp.
    async fn list_all_sales(&self) -> Result<Vec<SalesFact>, ServiceError>;

    /// One product's sales, oldest first.
    async fn list_sales_for_product(&self, product_id: Uuid)
        -> Result<Vec<SaleEntry>, ServiceError>;

    /// One product's sales summed per calendar month, earliest first.
    async fn list_monthly_totals(&self, product_id: Uuid)
        -> Result<Vec<MonthlyTotal>, ServiceError>;
}

/// Write side for the derived ledger and forecast rows.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Replaces a product's ledger and forecast rows atomically.
    async fn replace_product_snapshot(
        &self,
        product_id: Uuid,
        ledger: Vec<StockLedgerEntry>,
        forecasts: Vec<ForecastPoint>,
    ) -> Result<(), ServiceError>;
}
