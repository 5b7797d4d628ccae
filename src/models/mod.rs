// Domain values flowing between the aggregator, the synthesizer and the forecaster
pub mod forecast;
pub mod ledger;
pub mod sales;

pub use forecast::ForecastPoint;
pub use ledger::{ChangeType, StockLedgerEntry};
pub use sales::{MonthlyTotal, SaleEntry, SalesFact};
