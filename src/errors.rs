use sea_orm::error::DbErr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Snapshot write failed for product {product_id}: {message}")]
    SnapshotWriteFailed { product_id: Uuid, message: String },

    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl ServiceError {
    /// Whether retrying the whole run from scratch could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(DbErr::Conn(_))
                | Self::DatabaseError(DbErr::ConnectionAcquire(_))
                | Self::SnapshotWriteFailed { .. }
        )
    }
}
