//! Storage gateway ports.
//!
//! Each trait is a narrow capability over the shared store. The traits are
//! implemented on the transaction handle itself, so every call names the
//! transaction it runs in; services bound their handle only by the
//! capabilities they use.

use crate::review::domain::{PullRequest, PullRequestId, TeamName, User, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for storage gateway operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// User rows.
pub trait UserStore {
    /// Finds a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_user(&mut self, id: &UserId) -> StoreResult<Option<User>>;

    /// Returns active members of `team` whose identifiers are not in
    /// `exclude`, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find_active_candidates(
        &mut self,
        team: &TeamName,
        exclude: &[UserId],
    ) -> StoreResult<Vec<User>>;

    /// Sets the active flag of one user. Returns `false` when the user does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn set_user_active(&mut self, id: &UserId, is_active: bool) -> StoreResult<bool>;

    /// Deactivates every currently active user in `ids`, returning how many
    /// flags flipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn deactivate_users(&mut self, ids: &[UserId]) -> StoreResult<usize>;

    /// Lists every user ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_users(&mut self) -> StoreResult<Vec<User>>;
}

/// Team membership, derived from users sharing a team name.
pub trait TeamStore {
    /// Returns whether any user belongs to `team`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn team_exists(&mut self, team: &TeamName) -> StoreResult<bool>;

    /// Returns every member of `team` ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find_team_members(&mut self, team: &TeamName) -> StoreResult<Vec<User>>;

    /// Inserts users or overwrites name, team, and active flag of existing
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_users(&mut self, users: &[User]) -> StoreResult<()>;

    /// Marks this transaction as a writer of `team`'s candidate pool.
    ///
    /// Overlapping transactions that claim the same team cannot both commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when an overlapping transaction
    /// claimed the team first.
    fn claim_team(&mut self, team: &TeamName) -> StoreResult<()>;
}

/// Pull request rows.
pub trait PullRequestStore {
    /// Returns whether a pull request with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn pull_request_exists(&mut self, id: &PullRequestId) -> StoreResult<bool>;

    /// Finds a pull request by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>>;

    /// Finds a pull request and locks its row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a concurrent transaction changed
    /// the row, or another [`StoreError`] when the lookup fails.
    fn lock_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>>;

    /// Inserts a new pull request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the identifier is taken.
    fn insert_pull_request(&mut self, pull_request: &PullRequest) -> StoreResult<()>;

    /// Persists `status`, `merged_at`, and `updated_at` of an existing pull
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update_pull_request_status(&mut self, pull_request: &PullRequest) -> StoreResult<()>;

    /// Lists every pull request, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_pull_requests(&mut self) -> StoreResult<Vec<PullRequest>>;

    /// Lists open pull requests on which any of `reviewers` is assigned,
    /// ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find_open_reviewed_by_any(&mut self, reviewers: &[UserId])
    -> StoreResult<Vec<PullRequest>>;

    /// Lists pull requests on which `reviewer` is assigned, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find_reviewed_by(&mut self, reviewer: &UserId) -> StoreResult<Vec<PullRequest>>;
}

/// Reviewer edges between pull requests and users.
pub trait ReviewerStore {
    /// Adds an edge; adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn assign_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<()>;

    /// Returns the reviewers of `pr` ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn reviewers_of(&mut self, pr: &PullRequestId) -> StoreResult<Vec<UserId>>;

    /// Returns whether the edge exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn is_assigned(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool>;

    /// Swaps `old` for `new` on `pr` within the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `new` was assigned concurrently,
    /// or another [`StoreError`] when a write fails.
    fn replace_reviewer(
        &mut self,
        pr: &PullRequestId,
        old: &UserId,
        new: &UserId,
    ) -> StoreResult<()>;

    /// Removes one edge, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn remove_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool>;

    /// Returns the number of edges held by each reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn reviewer_counts(&mut self) -> StoreResult<BTreeMap<UserId, usize>>;
}

/// Errors returned by storage gateway and unit-of-work implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A row with the same key already exists.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A concurrent transaction won a conflicting write; retrying may
    /// succeed.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The transaction exceeded its time budget and was rolled back.
    ///
    /// Reported only after the rollback finished; nothing was committed.
    #[error("transaction timed out")]
    Timeout,

    /// The caller abandoned the transaction before it committed.
    #[error("transaction cancelled")]
    Cancelled,

    /// A connection could not be obtained or was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Timeout | Self::Connection(_)
        )
    }
}
