use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Predicted demand for one future calendar month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub product_id: Uuid,
    pub date: NaiveDate,
    /// Always at least 1
    pub predicted_demand: i64,
    /// 0..=100
    pub confidence_score: u8,
    pub model_type: String,
}
