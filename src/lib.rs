//! Inventory history and forecast backfill
//!
//! Reconstructs per-product stock ledgers from recorded sales, produces
//! short-horizon demand forecasts, and seeds demo catalogs to run them on.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::{AppConfig, GeneratorConfig, NegativeStockPolicy};
pub use errors::ServiceError;
pub use services::inventory_backfill::{BackfillReport, InventoryBackfill};
