// Month arithmetic and the seasonal table shared by seeding and forecasting
pub mod calendar;

// Pure stages: grouping sales, rebuilding ledgers, forecasting demand
pub mod demand_forecaster;
pub mod history_synthesizer;
pub mod sales_aggregator;

// Database-facing runners
pub mod catalog_seeder;
pub mod inventory_backfill;
