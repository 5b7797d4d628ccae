use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::ForecastPoint;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forecasting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub date: NaiveDate,
    pub predicted_demand: i32,
    pub confidence_score: Option<Decimal>,
    /// e.g. "SMA" for simple moving average
    pub model_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

impl ActiveModel {
    pub fn from_point(point: &ForecastPoint, now: DateTime<Utc>) -> Result<Self, ServiceError> {
        let predicted_demand = i32::try_from(point.predicted_demand).map_err(|_| {
            ServiceError::InvalidInput(format!(
                "predicted demand {} does not fit an INTEGER column",
                point.predicted_demand
            ))
        })?;
        Ok(Self {
            id: Set(Uuid::new_v4()),
            product_id: Set(point.product_id),
            date: Set(point.date),
            predicted_demand: Set(predicted_demand),
            confidence_score: Set(Some(Decimal::from(point.confidence_score))),
            model_type: Set(Some(point.model_type.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}
