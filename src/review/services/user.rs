//! User activity flag and review queue.

use super::error::{ReviewError, ReviewResult, log_failure};
use crate::review::{
    domain::{ReviewQueue, User, UserId},
    ports::{PullRequestStore, UnitOfWork, UserStore},
};
use std::sync::Arc;
use tracing::info;

/// Sets a user's active flag inside the caller's transaction.
///
/// Existing reviewer edges are left untouched.
///
/// # Errors
///
/// Returns [`ReviewError::UserNotFound`] when the user does not exist and
/// [`ReviewError::Store`] when storage fails.
pub fn set_is_active_in<S>(tx: &mut S, user_id: &UserId, is_active: bool) -> ReviewResult<User>
where
    S: UserStore,
{
    if !tx.set_user_active(user_id, is_active)? {
        return Err(ReviewError::UserNotFound(user_id.clone()));
    }
    let user = tx
        .find_user(user_id)?
        .ok_or_else(|| ReviewError::UserNotFound(user_id.clone()))?;
    info!(user_id = %user_id, is_active, "user activity updated");
    Ok(user)
}

/// User orchestration service.
#[derive(Clone)]
pub struct UserService<U>
where
    U: UnitOfWork,
{
    unit_of_work: Arc<U>,
}

impl<U> UserService<U>
where
    U: UnitOfWork,
    U::Tx: UserStore + PullRequestStore,
{
    /// Creates a new user service.
    #[must_use]
    pub const fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }

    /// Sets a user's active flag and returns the updated user.
    ///
    /// # Errors
    ///
    /// See [`set_is_active_in`].
    pub async fn set_is_active(&self, user_id: &UserId, is_active: bool) -> ReviewResult<User> {
        let id = user_id.clone();
        self.unit_of_work
            .within_transaction(move |tx| set_is_active_in(tx, &id, is_active))
            .await
            .inspect_err(|err| log_failure("set_is_active", err))
    }

    /// Lists the pull requests a user currently reviews, newest first.
    ///
    /// Unknown users have an empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Store`] when storage fails.
    pub async fn get_review(&self, user_id: &UserId) -> ReviewResult<ReviewQueue> {
        let id = user_id.clone();
        self.unit_of_work
            .within_transaction(move |tx| -> ReviewResult<ReviewQueue> {
                let pull_requests = tx.find_reviewed_by(&id)?;
                Ok(ReviewQueue {
                    user_id: id,
                    pull_requests,
                })
            })
            .await
    }
}
