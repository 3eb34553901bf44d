//! Pull request lifecycle: creation with reviewer selection, idempotent
//! merge, and reviewer reassignment.

use super::error::{ReviewError, ReviewResult, log_failure};
use crate::review::{
    domain::{
        CREATE_REVIEWER_QUOTA, MergeOutcome, PullRequest, PullRequestId, REASSIGN_REVIEWER_QUOTA,
        ReviewedPullRequest, ReviewerReassignment, UserId, select_reviewers,
    },
    ports::{PullRequestStore, ReviewerStore, StoreError, TeamStore, UnitOfWork, UserStore},
};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Request payload for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequestRequest {
    pull_request_id: String,
    title: String,
    author_id: String,
}

impl CreatePullRequestRequest {
    /// Creates a request from raw identifiers.
    #[must_use]
    pub fn new(
        pull_request_id: impl Into<String>,
        title: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            title: title.into(),
            author_id: author_id.into(),
        }
    }
}

/// Opens a pull request and assigns up to two active teammates of the
/// author inside the caller's transaction.
///
/// # Errors
///
/// Returns [`ReviewError::PullRequestExists`] when the identifier is taken,
/// [`ReviewError::UserNotFound`], [`ReviewError::AuthorInactive`], or
/// [`ReviewError::AuthorWithoutTeam`] when the author cannot open pull
/// requests, and [`ReviewError::Store`] when storage fails.
pub fn create_pull_request_in<S>(
    tx: &mut S,
    pull_request: PullRequest,
) -> ReviewResult<ReviewedPullRequest>
where
    S: UserStore + TeamStore + PullRequestStore + ReviewerStore,
{
    let id = pull_request.id().clone();
    if tx.pull_request_exists(&id)? {
        return Err(ReviewError::PullRequestExists(id));
    }

    let author_id = pull_request.author_id();
    let author = tx
        .find_user(author_id)?
        .ok_or_else(|| ReviewError::UserNotFound(author_id.clone()))?;
    if !author.is_active() {
        return Err(ReviewError::AuthorInactive(author_id.clone()));
    }
    let Some(team) = author.team_name() else {
        return Err(ReviewError::AuthorWithoutTeam(author_id.clone()));
    };

    tx.claim_team(team)?;
    let candidates = tx.find_active_candidates(team, std::slice::from_ref(author.id()))?;
    let exclude = BTreeSet::from([author.id().clone()]);
    let reviewers = select_reviewers(&candidates, &exclude, CREATE_REVIEWER_QUOTA);

    tx.insert_pull_request(&pull_request)
        .map_err(|err| match err {
            StoreError::Duplicate(_) => ReviewError::PullRequestExists(id.clone()),
            other => ReviewError::Store(other),
        })?;
    for reviewer in &reviewers {
        tx.assign_reviewer(&id, reviewer)?;
    }

    if reviewers.is_empty() {
        warn!(pull_request_id = %id, team = %team, "no active reviewers available");
    }
    info!(
        pull_request_id = %id,
        author_id = %author.id(),
        reviewers = reviewers.len(),
        "pull request created"
    );
    Ok(ReviewedPullRequest::new(pull_request, reviewers))
}

/// Merges a pull request inside the caller's transaction.
///
/// An already merged pull request is returned unchanged without a write.
///
/// # Errors
///
/// Returns [`ReviewError::PullRequestNotFound`] when the pull request is
/// absent and [`ReviewError::Store`] when storage fails.
pub fn merge_pull_request_in<S>(
    tx: &mut S,
    id: &PullRequestId,
    clock: &impl Clock,
) -> ReviewResult<ReviewedPullRequest>
where
    S: PullRequestStore + ReviewerStore,
{
    let mut pull_request = tx
        .lock_pull_request(id)?
        .ok_or_else(|| ReviewError::PullRequestNotFound(id.clone()))?;

    match pull_request.merge(clock) {
        MergeOutcome::Merged => {
            tx.update_pull_request_status(&pull_request)?;
            info!(pull_request_id = %id, "pull request merged");
        }
        MergeOutcome::AlreadyMerged => {
            info!(pull_request_id = %id, "pull request already merged");
        }
    }

    let reviewers = tx.reviewers_of(id)?;
    Ok(ReviewedPullRequest::new(pull_request, reviewers))
}

/// Replaces `old_reviewer` on an open pull request with one active teammate
/// of the old reviewer, inside the caller's transaction.
///
/// The author and every current reviewer are excluded from the pool.
///
/// # Errors
///
/// Returns [`ReviewError::PullRequestNotFound`],
/// [`ReviewError::PullRequestMerged`], [`ReviewError::NotAssigned`],
/// [`ReviewError::UserNotFound`], or [`ReviewError::NoCandidate`] when the
/// reassignment is not possible, and [`ReviewError::Store`] when storage
/// fails.
pub fn reassign_reviewer_in<S>(
    tx: &mut S,
    id: &PullRequestId,
    old_reviewer: &UserId,
) -> ReviewResult<ReviewerReassignment>
where
    S: UserStore + TeamStore + PullRequestStore + ReviewerStore,
{
    let pull_request = tx
        .lock_pull_request(id)?
        .ok_or_else(|| ReviewError::PullRequestNotFound(id.clone()))?;
    if pull_request.is_merged() {
        return Err(ReviewError::PullRequestMerged(id.clone()));
    }

    if !tx.is_assigned(id, old_reviewer)? {
        return Err(ReviewError::NotAssigned {
            pull_request: id.clone(),
            reviewer: old_reviewer.clone(),
        });
    }
    let current = tx.reviewers_of(id)?;

    let reviewer = tx
        .find_user(old_reviewer)?
        .ok_or_else(|| ReviewError::UserNotFound(old_reviewer.clone()))?;
    let Some(team) = reviewer.team_name() else {
        return Err(ReviewError::NoCandidate(id.clone()));
    };

    let exclude: BTreeSet<UserId> = current
        .iter()
        .cloned()
        .chain(std::iter::once(pull_request.author_id().clone()))
        .collect();
    let excluded: Vec<UserId> = exclude.iter().cloned().collect();
    tx.claim_team(team)?;
    let candidates = tx.find_active_candidates(team, &excluded)?;
    let Some(replacement) = select_reviewers(&candidates, &exclude, REASSIGN_REVIEWER_QUOTA)
        .into_iter()
        .next()
    else {
        return Err(ReviewError::NoCandidate(id.clone()));
    };

    tx.replace_reviewer(id, old_reviewer, &replacement)?;
    let reviewers = tx.reviewers_of(id)?;
    info!(
        pull_request_id = %id,
        old_reviewer = %old_reviewer,
        new_reviewer = %replacement,
        "reviewer reassigned"
    );
    Ok(ReviewerReassignment::new(
        ReviewedPullRequest::new(pull_request, reviewers),
        replacement,
    ))
}

/// Loads one pull request with its reviewers.
///
/// # Errors
///
/// Returns [`ReviewError::PullRequestNotFound`] when absent and
/// [`ReviewError::Store`] when storage fails.
pub fn find_pull_request_in<S>(tx: &mut S, id: &PullRequestId) -> ReviewResult<ReviewedPullRequest>
where
    S: PullRequestStore + ReviewerStore,
{
    let pull_request = tx
        .find_pull_request(id)?
        .ok_or_else(|| ReviewError::PullRequestNotFound(id.clone()))?;
    let reviewers = tx.reviewers_of(id)?;
    Ok(ReviewedPullRequest::new(pull_request, reviewers))
}

/// Loads every pull request with its reviewers, newest first.
///
/// # Errors
///
/// Returns [`ReviewError::Store`] when storage fails.
pub fn list_pull_requests_in<S>(tx: &mut S) -> ReviewResult<Vec<ReviewedPullRequest>>
where
    S: PullRequestStore + ReviewerStore,
{
    let pull_requests = tx.list_pull_requests()?;
    pull_requests
        .into_iter()
        .map(|pull_request| {
            let reviewers = tx.reviewers_of(pull_request.id())?;
            Ok(ReviewedPullRequest::new(pull_request, reviewers))
        })
        .collect()
}

/// Pull request lifecycle orchestration service.
#[derive(Clone)]
pub struct PullRequestService<U, C>
where
    U: UnitOfWork,
    C: Clock + Send + Sync,
{
    unit_of_work: Arc<U>,
    clock: Arc<C>,
}

impl<U, C> PullRequestService<U, C>
where
    U: UnitOfWork,
    U::Tx: UserStore + TeamStore + PullRequestStore + ReviewerStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new pull request service.
    #[must_use]
    pub const fn new(unit_of_work: Arc<U>, clock: Arc<C>) -> Self {
        Self {
            unit_of_work,
            clock,
        }
    }

    /// Opens a pull request and assigns up to two reviewers.
    ///
    /// Zero reviewers is a valid outcome when the author has no active
    /// teammates.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Domain`] when an identifier or the title is
    /// blank; see [`create_pull_request_in`] for the remaining cases.
    pub async fn create_pull_request(
        &self,
        request: CreatePullRequestRequest,
    ) -> ReviewResult<ReviewedPullRequest> {
        self.open_and_assign(request)
            .await
            .inspect_err(|err| log_failure("create_pull_request", err))
    }

    async fn open_and_assign(
        &self,
        request: CreatePullRequestRequest,
    ) -> ReviewResult<ReviewedPullRequest> {
        let id = PullRequestId::new(request.pull_request_id)?;
        let author_id = UserId::new(request.author_id)?;
        let pull_request = PullRequest::open(id, request.title, author_id, &*self.clock)?;
        self.unit_of_work
            .within_transaction(move |tx| create_pull_request_in(tx, pull_request))
            .await
    }

    /// Merges a pull request; merging twice is a no-op.
    ///
    /// # Errors
    ///
    /// See [`merge_pull_request_in`].
    pub async fn merge_pull_request(&self, id: &PullRequestId) -> ReviewResult<ReviewedPullRequest> {
        let pull_request_id = id.clone();
        let clock = Arc::clone(&self.clock);
        self.unit_of_work
            .within_transaction(move |tx| merge_pull_request_in(tx, &pull_request_id, &*clock))
            .await
            .inspect_err(|err| log_failure("merge_pull_request", err))
    }

    /// Replaces one reviewer on an open pull request.
    ///
    /// # Errors
    ///
    /// See [`reassign_reviewer_in`].
    pub async fn reassign_reviewer(
        &self,
        id: &PullRequestId,
        old_reviewer: &UserId,
    ) -> ReviewResult<ReviewerReassignment> {
        let pull_request_id = id.clone();
        let reviewer_id = old_reviewer.clone();
        self.unit_of_work
            .within_transaction(move |tx| reassign_reviewer_in(tx, &pull_request_id, &reviewer_id))
            .await
            .inspect_err(|err| log_failure("reassign_reviewer", err))
    }

    /// Retrieves a pull request with its reviewers.
    ///
    /// # Errors
    ///
    /// See [`find_pull_request_in`].
    pub async fn find_pull_request(&self, id: &PullRequestId) -> ReviewResult<ReviewedPullRequest> {
        let pull_request_id = id.clone();
        self.unit_of_work
            .within_transaction(move |tx| find_pull_request_in(tx, &pull_request_id))
            .await
    }

    /// Lists every pull request with its reviewers, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Store`] when storage fails.
    pub async fn list_pull_requests(&self) -> ReviewResult<Vec<ReviewedPullRequest>> {
        self.unit_of_work
            .within_transaction(list_pull_requests_in)
            .await
    }
}
