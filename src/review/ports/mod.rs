//! Port contracts for reviewer assignment.
//!
//! Ports define infrastructure-agnostic interfaces used by review services.

pub mod store;
pub mod unit_of_work;

pub use store::{
    PullRequestStore, ReviewerStore, StoreError, StoreResult, TeamStore, UserStore,
};
pub use unit_of_work::{
    CancellationGuard, DEFAULT_TRANSACTION_TIMEOUT, MAX_TRANSACTION_TIMEOUT, TransactionDeadline,
    UnitOfWork,
};
