/*!
 * Transaction Helper Utilities
 *
 * Scoped transactions: commit when the closure succeeds, roll back otherwise.
 */

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// # Example
///
/// ```rust,ignore
/// use inventory_backfill::db::transaction::with_transaction;
///
/// with_transaction(&db, |txn| {
///     Box::pin(async move {
///         product_history::Entity::delete_many().exec(txn).await?;
///         Ok::<_, ServiceError>(())
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + From<DbErr> + Send,
{
    db.transaction(f).await.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbBackend, Statement};

    async fn sqlite() -> DatabaseConnection {
        // One pooled connection, otherwise each connection sees its own in-memory database
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TABLE t (v INTEGER NOT NULL)".to_string(),
        ))
        .await
        .unwrap();
        db
    }

    async fn count(db: &DatabaseConnection) -> i64 {
        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM t".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i64>("", "n").unwrap()
    }

    #[tokio::test]
    async fn commits_on_success() {
        let db = sqlite().await;
        with_transaction(&db, |txn| {
            Box::pin(async move {
                txn.execute(Statement::from_string(
                    DbBackend::Sqlite,
                    "INSERT INTO t (v) VALUES (1)".to_string(),
                ))
                .await?;
                Ok::<_, ServiceError>(())
            })
        })
        .await
        .unwrap();
        assert_eq!(count(&db).await, 1);
    }

    #[tokio::test]
    async fn rolls_back_on_error() {
        let db = sqlite().await;
        let result: Result<(), ServiceError> = with_transaction(&db, |txn| {
            Box::pin(async move {
                txn.execute(Statement::from_string(
                    DbBackend::Sqlite,
                    "INSERT INTO t (v) VALUES (1)".to_string(),
                ))
                .await?;
                Err(ServiceError::InternalError("abort".into()))
            })
        })
        .await;
        assert!(matches!(result, Err(ServiceError::InternalError(_))));
        assert_eq!(count(&db).await, 0);
    }
}
