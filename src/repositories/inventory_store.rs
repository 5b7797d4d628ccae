use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::{BaseRepository, ProductRepository, Repository, SalesRepository, SnapshotSink};
use crate::db::with_transaction;
use crate::entities::{forecast, order, order_item, product, product_history};
use crate::errors::ServiceError;
use crate::models::{ForecastPoint, MonthlyTotal, SaleEntry, SalesFact, StockLedgerEntry};
use crate::services::sales_aggregator::{monthly_totals, sort_entries};

/// Rows per INSERT statement; keeps bind parameters under SQLite's limit.
pub const INSERT_CHUNK_SIZE: usize = 100;

/// SeaORM-backed store for products, sales and the derived snapshot tables.
#[derive(Debug, Clone)]
pub struct SeaOrmInventoryStore {
    base: BaseRepository,
}

impl SeaOrmInventoryStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn load_sales(&self, product_id: Option<Uuid>) -> Result<Vec<SalesFact>, ServiceError> {
        let mut query = order_item::Entity::find().find_also_related(order::Entity);
        if let Some(id) = product_id {
            query = query.filter(order_item::Column::ProductId.eq(id));
        }

        let rows = query.all(self.base.get_db()).await?;
        let mut facts = Vec::with_capacity(rows.len());
        for (item, parent) in rows {
            let Some(parent) = parent else {
                warn!(order_item_id = %item.id, order_id = %item.order_id, "Skipping order item without an order");
                continue;
            };
            facts.push(SalesFact {
                product_id: item.product_id,
                order_id: item.order_id,
                quantity: item.quantity,
                occurred_at: parent.created_at,
            });
        }
        Ok(facts)
    }

    /// A product's stored ledger in ledger order.
    pub async fn ledger_for(&self, product_id: Uuid) -> Result<Vec<StockLedgerEntry>, ServiceError> {
        product_history::Entity::find()
            .filter(product_history::Column::ProductId.eq(product_id))
            .order_by_asc(product_history::Column::Sequence)
            .all(self.base.get_db())
            .await?
            .into_iter()
            .map(StockLedgerEntry::try_from)
            .collect()
    }

    /// A product's stored forecast rows, earliest target first.
    pub async fn forecasts_for(&self, product_id: Uuid) -> Result<Vec<forecast::Model>, ServiceError> {
        Ok(forecast::Entity::find()
            .filter(forecast::Column::ProductId.eq(product_id))
            .order_by_asc(forecast::Column::Date)
            .all(self.base.get_db())
            .await?)
    }
}

#[async_trait]
impl ProductRepository for SeaOrmInventoryStore {
    #[instrument(skip(self))]
    async fn list_product_ids(&self) -> Result<Vec<Uuid>, ServiceError> {
        let ids = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .order_by_asc(product::Column::Id)
            .into_tuple::<Uuid>()
            .all(self.base.get_db())
            .await?;
        debug!(count = ids.len(), "Listed products");
        Ok(ids)
    }

    async fn current_quantity(&self, product_id: Uuid) -> Result<i64, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(self.base.get_db())
            .await?
            .map(|p| i64::from(p.quantity))
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}

#[async_trait]
impl SalesRepository for SeaOrmInventoryStore {
    #[instrument(skip(self))]
    async fn list_all_sales(&self) -> Result<Vec<SalesFact>, ServiceError> {
        let facts = self.load_sales(None).await?;
        debug!(count = facts.len(), "Loaded sales facts");
        Ok(facts)
    }

    async fn list_sales_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<SaleEntry>, ServiceError> {
        let mut entries: Vec<SaleEntry> = self
            .load_sales(Some(product_id))
            .await?
            .iter()
            .map(SaleEntry::from)
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn list_monthly_totals(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<MonthlyTotal>, ServiceError> {
        let entries = self.list_sales_for_product(product_id).await?;
        Ok(monthly_totals(&entries))
    }
}

#[async_trait]
impl SnapshotSink for SeaOrmInventoryStore {
    #[instrument(skip(self, ledger, forecasts), fields(ledger_rows = ledger.len(), forecast_points = forecasts.len()))]
    async fn replace_product_snapshot(
        &self,
        product_id: Uuid,
        ledger: Vec<StockLedgerEntry>,
        forecasts: Vec<ForecastPoint>,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let history_rows = ledger
            .iter()
            .enumerate()
            .map(|(position, entry)| product_history::ActiveModel::from_entry(entry, position))
            .collect::<Result<Vec<_>, _>>()?;
        let forecast_rows = forecasts
            .iter()
            .map(|point| forecast::ActiveModel::from_point(point, now))
            .collect::<Result<Vec<_>, _>>()?;

        let start = Instant::now();
        let result = with_transaction(self.base.get_db(), move |txn| {
            Box::pin(async move {
                product_history::Entity::delete_many()
                    .filter(product_history::Column::ProductId.eq(product_id))
                    .exec(txn)
                    .await?;
                forecast::Entity::delete_many()
                    .filter(forecast::Column::ProductId.eq(product_id))
                    .exec(txn)
                    .await?;

                for chunk in history_rows.chunks(INSERT_CHUNK_SIZE) {
                    product_history::Entity::insert_many(chunk.to_vec())
                        .exec_without_returning(txn)
                        .await?;
                }
                for chunk in forecast_rows.chunks(INSERT_CHUNK_SIZE) {
                    forecast::Entity::insert_many(chunk.to_vec())
                        .exec_without_returning(txn)
                        .await?;
                }
                Ok::<_, ServiceError>(())
            })
        })
        .await;

        histogram!(
            "inventory_backfill.snapshot_write_seconds",
            start.elapsed().as_secs_f64()
        );

        result.map_err(|e| {
            error!(product_id = %product_id, error = %e, "Snapshot write rolled back");
            counter!("inventory_backfill.snapshot_write_failures", 1);
            match e {
                ServiceError::DatabaseError(db_err) => ServiceError::SnapshotWriteFailed {
                    product_id,
                    message: db_err.to_string(),
                },
                other => other,
            }
        })
    }
}
