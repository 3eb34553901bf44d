//! Adapter implementations for review ports.

pub mod memory;
pub mod postgres;

use crate::review::ports::{StoreError, TransactionDeadline};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Time past the deadline after which a still-running transaction is logged.
const COMMIT_GRACE: Duration = Duration::from_secs(1);

/// Awaits a transaction running on the blocking pool.
///
/// The result is only reported once the blocking task has finished, so a
/// [`StoreError::Timeout`] always means the transaction rolled back. An
/// overrunning body is bounded by its own deadline check before commit and,
/// on Postgres, by the statement timeout.
///
/// Panics raised by the transaction body are resumed here, on the caller's
/// task, after the adapter has rolled back.
async fn await_transaction<T, E>(
    mut handle: JoinHandle<Result<T, E>>,
    deadline: &TransactionDeadline,
) -> Result<T, E>
where
    E: From<StoreError>,
{
    let budget = deadline.remaining().saturating_add(COMMIT_GRACE);
    let joined = match tokio::time::timeout(budget, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!(
                budget_ms = budget.as_millis(),
                "transaction overran its deadline; awaiting its outcome"
            );
            handle.await
        }
    };
    match joined {
        Ok(outcome) => outcome,
        Err(join_error) if join_error.is_panic() => {
            std::panic::resume_unwind(join_error.into_panic())
        }
        Err(join_error) => {
            error!(error = %join_error, "transaction task failed to complete");
            Err(StoreError::persistence(join_error).into())
        }
    }
}
