//! Batch runner that rebuilds every product's stock ledger and demand forecast.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::errors::ServiceError;
use crate::models::{MonthlyTotal, SaleEntry};
use crate::repositories::{ProductRepository, SalesRepository, SnapshotSink};
use crate::services::demand_forecaster::forecast_demand;
use crate::services::history_synthesizer::synthesize_history;
use crate::services::sales_aggregator::aggregate_sales;

/// Outcome of a backfill run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub products_processed: usize,
    pub ledger_rows: usize,
    pub forecast_points: usize,
    /// Products whose snapshot could not be built or written, with the reason
    pub failed: Vec<(Uuid, String)>,
}

impl BackfillReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Counts written for a single product.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub ledger_rows: usize,
    pub forecast_points: usize,
}

/// Rebuilds derived ledger and forecast rows from products and sales.
pub struct InventoryBackfill {
    products: Arc<dyn ProductRepository>,
    sales: Arc<dyn SalesRepository>,
    sink: Arc<dyn SnapshotSink>,
    config: GeneratorConfig,
}

impl InventoryBackfill {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        sales: Arc<dyn SalesRepository>,
        sink: Arc<dyn SnapshotSink>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            products,
            sales,
            sink,
            config,
        }
    }

    /// Processes every product in ascending id order with one generator.
    ///
    /// Sales are loaded once and grouped in memory. A product that fails is
    /// recorded in the report and the run moves on; errors loading products or
    /// sales abort the run.
    #[instrument(skip(self, rng))]
    pub async fn run<R: Rng + Send + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<BackfillReport, ServiceError> {
        let started = Instant::now();
        let product_ids = self.products.list_product_ids().await?;
        let facts = self.sales.list_all_sales().await?;
        let aggregate = aggregate_sales(&facts)?;

        info!(
            products = product_ids.len(),
            sales = aggregate.total_facts(),
            historical_months = self.config.historical_months,
            "Starting inventory backfill"
        );

        let mut report = BackfillReport::default();
        for product_id in product_ids {
            let outcome = self
                .write_snapshot(
                    product_id,
                    aggregate.orders_for(product_id),
                    aggregate.monthly_totals_for(product_id),
                    rng,
                    now,
                )
                .await;

            match outcome {
                Ok(snapshot) => {
                    report.products_processed += 1;
                    report.ledger_rows += snapshot.ledger_rows;
                    report.forecast_points += snapshot.forecast_points;
                }
                Err(e) => {
                    warn!(product_id = %product_id, error = %e, transient = e.is_transient(), "Skipping product");
                    counter!("inventory_backfill.product_failures", 1);
                    report.failed.push((product_id, e.to_string()));
                }
            }
        }

        histogram!(
            "inventory_backfill.run_seconds",
            started.elapsed().as_secs_f64()
        );
        counter!(
            "inventory_backfill.ledger_rows",
            report.ledger_rows as u64
        );
        counter!(
            "inventory_backfill.forecast_points",
            report.forecast_points as u64
        );

        if report.is_clean() {
            info!(
                products = report.products_processed,
                ledger_rows = report.ledger_rows,
                forecast_points = report.forecast_points,
                "Inventory backfill completed"
            );
        } else {
            error!(
                products = report.products_processed,
                failed = report.failed.len(),
                "Inventory backfill completed with failures"
            );
        }

        Ok(report)
    }

    /// Rebuilds one product's snapshot, reading its sales directly.
    pub async fn backfill_product<R: Rng + Send + ?Sized>(
        &self,
        product_id: Uuid,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ProductSnapshot, ServiceError> {
        let sales = self.sales.list_sales_for_product(product_id).await?;
        let monthly = self.sales.list_monthly_totals(product_id).await?;
        self.write_snapshot(product_id, &sales, &monthly, rng, now)
            .await
    }

    async fn write_snapshot<R: Rng + Send + ?Sized>(
        &self,
        product_id: Uuid,
        sales: &[SaleEntry],
        monthly: &[MonthlyTotal],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ProductSnapshot, ServiceError> {
        let current_quantity = self.products.current_quantity(product_id).await?;

        let ledger =
            synthesize_history(product_id, current_quantity, sales, &self.config, now, rng)?;
        let forecasts = forecast_demand(product_id, monthly, &self.config, now, rng)?;

        let snapshot = ProductSnapshot {
            ledger_rows: ledger.len(),
            forecast_points: forecasts.len(),
        };
        self.sink
            .replace_product_snapshot(product_id, ledger, forecasts)
            .await?;

        Ok(snapshot)
    }
}
