use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::StockLedgerEntry;

/// Stored stock ledger row. `quantity` is the level after the change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub date: NaiveDate,
    pub quantity: i32,
    pub change_amount: i32,
    /// order, restock or adjustment
    pub change_type: String,
    pub reference_id: Option<Uuid>,
    /// Position in the product's ledger; breaks ties between rows sharing a timestamp
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn to_column(value: i64, field: &str) -> Result<i32, ServiceError> {
    i32::try_from(value).map_err(|_| {
        ServiceError::InvalidInput(format!("{} {} does not fit an INTEGER column", field, value))
    })
}

impl ActiveModel {
    pub fn from_entry(entry: &StockLedgerEntry, sequence: usize) -> Result<Self, ServiceError> {
        let sequence = i32::try_from(sequence).map_err(|_| {
            ServiceError::InvalidInput(format!("ledger position {} is out of range", sequence))
        })?;
        Ok(Self {
            id: Set(Uuid::new_v4()),
            product_id: Set(entry.product_id),
            date: Set(entry.date),
            quantity: Set(to_column(entry.quantity_after, "quantity")?),
            change_amount: Set(to_column(entry.change_amount, "change_amount")?),
            change_type: Set(entry.change_type.to_string()),
            reference_id: Set(entry.reference_id),
            sequence: Set(sequence),
            created_at: Set(entry.created_at),
        })
    }
}

impl TryFrom<Model> for StockLedgerEntry {
    type Error = ServiceError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let change_type = model.change_type.parse().map_err(|_| {
            ServiceError::InvalidInput(format!("unknown change type '{}'", model.change_type))
        })?;
        Ok(Self {
            product_id: model.product_id,
            date: model.date,
            quantity_after: i64::from(model.quantity),
            change_amount: i64::from(model.change_amount),
            change_type,
            reference_id: model.reference_id,
            created_at: model.created_at,
        })
    }
}
