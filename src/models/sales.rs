use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quantity of a product sold as part of an order. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFact {
    pub product_id: Uuid,
    pub order_id: Uuid,
    pub quantity: i32,
    pub occurred_at: DateTime<Utc>,
}

/// One sale of a known product, as listed for that product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEntry {
    pub occurred_at: DateTime<Utc>,
    pub quantity: i32,
    pub order_id: Uuid,
}

impl From<&SalesFact> for SaleEntry {
    fn from(fact: &SalesFact) -> Self {
        Self {
            occurred_at: fact.occurred_at,
            quantity: fact.quantity,
            order_id: fact.order_id,
        }
    }
}

/// Units sold during one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the month
    pub month: NaiveDate,
    pub total_quantity: i64,
}
