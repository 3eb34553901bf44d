//! Snapshot-and-swap unit of work.

use super::MemorySnapshot;
use crate::review::{
    adapters::await_transaction,
    ports::{DEFAULT_TRANSACTION_TIMEOUT, StoreError, TransactionDeadline, UnitOfWork},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Thread-safe in-memory store with transactional semantics.
///
/// Each transaction works on a private copy of the committed snapshot while
/// holding the store mutex, so transactions are serializable. The copy
/// replaces the committed snapshot only when the work succeeds within its
/// deadline.
#[derive(Debug, Clone)]
pub struct InMemoryUnitOfWork {
    state: Arc<Mutex<MemorySnapshot>>,
    timeout: Duration,
}

impl Default for InMemoryUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUnitOfWork {
    /// Creates an empty store with the default transaction timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TRANSACTION_TIMEOUT)
    }

    /// Creates an empty store with a custom transaction timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemorySnapshot::new())),
            timeout,
        }
    }

    /// Returns a copy of the committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Tx = MemorySnapshot;

    async fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let (deadline, _cancellation) = TransactionDeadline::start(self.timeout);
        let commit_deadline = deadline.clone();

        let handle = tokio::task::spawn_blocking(move || -> Result<T, E> {
            // A panicking transaction poisons the lock but never touches the
            // committed snapshot, so the inner value is still consistent.
            let mut committed = state.lock().unwrap_or_else(PoisonError::into_inner);
            let mut working = committed.clone();
            let value = work(&mut working)?;
            commit_deadline.ensure_open()?;
            *committed = working;
            Ok(value)
        });

        await_transaction(handle, &deadline).await
    }
}
