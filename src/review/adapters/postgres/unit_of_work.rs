//! Repeatable Read unit of work over an r2d2 connection pool.

use super::errors::store_error;
use crate::review::{
    adapters::await_transaction,
    ports::{
        DEFAULT_TRANSACTION_TIMEOUT, StoreError, StoreResult, TransactionDeadline, UnitOfWork,
    },
};
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::time::Duration;
use tracing::{debug, info, warn};

/// `PostgreSQL` connection pool type used by review adapters.
pub type ReviewPgPool = Pool<ConnectionManager<PgConnection>>;

/// Schema for the review tables; every statement is idempotent.
pub const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-03-02-000000_create_review_tables/up.sql");

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`StoreError::Connection`] when the pool cannot open its initial
/// connections.
pub fn build_pool(database_url: &str, max_connections: u32) -> StoreResult<ReviewPgPool> {
    Pool::builder()
        .max_size(max_connections.max(1))
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .map_err(|err| StoreError::Connection(err.to_string()))
}

/// Applies [`SCHEMA_SQL`] on `connection`.
///
/// # Errors
///
/// Returns [`StoreError`] when a statement fails.
pub fn apply_schema(connection: &mut PgConnection) -> StoreResult<()> {
    connection.batch_execute(SCHEMA_SQL).map_err(store_error)
}

/// Why a transaction body did not reach commit.
enum TxAbort<E> {
    Work(E),
    Store(StoreError),
    Panicked(Box<dyn Any + Send>),
}

impl<E> From<DieselError> for TxAbort<E> {
    fn from(error: DieselError) -> Self {
        Self::Store(store_error(error))
    }
}

/// `PostgreSQL`-backed unit of work.
///
/// Every transaction runs at Repeatable Read on a pooled connection inside
/// the blocking thread pool. Statements are bounded by the time left in the
/// transaction budget.
#[derive(Debug, Clone)]
pub struct PostgresUnitOfWork {
    pool: ReviewPgPool,
    timeout: Duration,
}

impl PostgresUnitOfWork {
    /// Creates a unit of work with the default transaction timeout.
    #[must_use]
    pub const fn new(pool: ReviewPgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_TRANSACTION_TIMEOUT)
    }

    /// Creates a unit of work with a custom transaction timeout.
    #[must_use]
    pub const fn with_timeout(pool: ReviewPgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &ReviewPgPool {
        &self.pool
    }

    /// Creates the review tables when they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when no connection is available or a statement
    /// fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| StoreError::Connection(err.to_string()))?;
            apply_schema(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)??;
        info!("review schema applied");
        Ok(())
    }
}

fn set_statement_timeout(connection: &mut PgConnection, budget: Duration) -> QueryResult<()> {
    let millis = budget.as_millis().clamp(1, u128::from(u32::MAX));
    connection.batch_execute(&format!("SET LOCAL statement_timeout = {millis}"))
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Tx = PgConnection;

    async fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let (deadline, _cancellation) = TransactionDeadline::start(self.timeout);
        let commit_deadline = deadline.clone();

        let handle = tokio::task::spawn_blocking(move || -> Result<T, E> {
            commit_deadline.ensure_open()?;
            let mut connection = pool
                .get()
                .map_err(|err| StoreError::Connection(err.to_string()))?;

            let outcome = connection
                .build_transaction()
                .repeatable_read()
                .run(|tx| -> Result<T, TxAbort<E>> {
                    set_statement_timeout(tx, commit_deadline.remaining())?;
                    let value = match catch_unwind(AssertUnwindSafe(|| work(tx))) {
                        Ok(Ok(value)) => value,
                        Ok(Err(err)) => return Err(TxAbort::Work(err)),
                        Err(payload) => return Err(TxAbort::Panicked(payload)),
                    };
                    commit_deadline.ensure_open().map_err(TxAbort::Store)?;
                    Ok(value)
                });

            match outcome {
                Ok(value) => Ok(value),
                Err(TxAbort::Work(err)) => {
                    debug!("transaction rolled back by its body");
                    Err(err)
                }
                Err(TxAbort::Store(err)) => {
                    warn!(error = %err, transient = err.is_transient(), "transaction rolled back");
                    Err(err.into())
                }
                Err(TxAbort::Panicked(payload)) => {
                    warn!("transaction body panicked; rolled back");
                    resume_unwind(payload)
                }
            }
        });

        await_transaction(handle, &deadline).await
    }
}
