//! Unit-of-work port and the deadline bookkeeping shared by its adapters.

use super::store::{StoreError, StoreResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default time budget for one transaction.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound applied to configured transaction timeouts.
pub const MAX_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Transactional scope over the storage gateway.
///
/// `work` receives the transaction handle and runs to completion before the
/// adapter commits. Returning `Err` rolls back every write made through the
/// handle; so does a panic, which is resumed on the calling task after the
/// rollback. Code that already holds a handle passes it on instead of opening
/// a nested transaction.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Transaction handle implementing the storage gateway traits.
    type Tx: Send + 'static;

    /// Runs `work` inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`StoreError`] converted
    /// into `E` when the transaction cannot begin, times out, is cancelled,
    /// or fails to commit.
    async fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;
}

/// Time budget and cancellation flag for one transaction.
///
/// Adapters check [`TransactionDeadline::ensure_open`] immediately before
/// committing, so an expired or abandoned transaction always rolls back.
#[derive(Debug, Clone)]
pub struct TransactionDeadline {
    expires_at: Instant,
    cancelled: Arc<AtomicBool>,
}

impl TransactionDeadline {
    /// Starts a deadline `timeout` from now.
    ///
    /// The returned guard marks the transaction cancelled when dropped; keep
    /// it alive in the future that awaits the transaction.
    #[must_use]
    pub fn start(timeout: Duration) -> (Self, CancellationGuard) {
        let now = Instant::now();
        let budget = timeout.min(MAX_TRANSACTION_TIMEOUT);
        let cancelled = Arc::new(AtomicBool::new(false));
        let deadline = Self {
            expires_at: now.checked_add(budget).unwrap_or(now),
            cancelled: Arc::clone(&cancelled),
        };
        (deadline, CancellationGuard { cancelled })
    }

    /// Returns the time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Returns whether the transaction may still commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] when the caller went away and
    /// [`StoreError::Timeout`] when the deadline passed.
    pub fn ensure_open(&self) -> StoreResult<()> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(StoreError::Cancelled);
        }
        if Instant::now() >= self.expires_at {
            return Err(StoreError::Timeout);
        }
        Ok(())
    }
}

/// Marks the paired [`TransactionDeadline`] cancelled on drop.
#[derive(Debug)]
pub struct CancellationGuard {
    cancelled: Arc<AtomicBool>,
}

impl Drop for CancellationGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
