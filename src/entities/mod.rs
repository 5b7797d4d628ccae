pub mod category;
pub mod forecast;
pub mod order;
pub mod order_item;
pub mod product; // Products carry the live on-hand quantity the ledger ends at
pub mod product_history;
pub mod supplier;
