use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Kind of stock movement recorded in the ledger.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
    Order,
    Restock,
    Adjustment,
}

/// One row of a product's stock ledger.
///
/// `quantity_after` is the level immediately after the change; for every row
/// after the first, `quantity_after = previous.quantity_after + change_amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLedgerEntry {
    pub product_id: Uuid,
    pub date: NaiveDate,
    pub quantity_after: i64,
    pub change_amount: i64,
    pub change_type: ChangeType,
    /// Order id for `order` rows
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl StockLedgerEntry {
    /// Stock level immediately before this change.
    pub fn quantity_before(&self) -> i64 {
        self.quantity_after - self.change_amount
    }
}

/// Replays a date-ordered ledger forward from the level before its first row.
///
/// Returns `None` for an empty ledger.
pub fn replay_forward(ledger: &[StockLedgerEntry]) -> Option<i64> {
    let first = ledger.first()?;
    Some(
        ledger
            .iter()
            .fold(first.quantity_before(), |level, row| level + row.change_amount),
    )
}
