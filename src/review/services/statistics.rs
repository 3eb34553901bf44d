//! Review load reporting.

use super::error::{ReviewResult, log_failure};
use crate::review::{
    domain::{
        PullRequestReviewStats, PullRequestStatus, ReviewStatistics, UserId, UserReviewStats,
    },
    ports::{PullRequestStore, ReviewerStore, UnitOfWork, UserStore},
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Collects review statistics from one transaction's view of the store.
///
/// # Errors
///
/// Returns [`super::ReviewError::Store`] when storage fails.
pub fn collect_statistics_in<S>(tx: &mut S) -> ReviewResult<ReviewStatistics>
where
    S: UserStore + PullRequestStore + ReviewerStore,
{
    let users = tx.list_users()?;
    let pull_requests = tx.list_pull_requests()?;
    let assignment_counts = tx.reviewer_counts()?;

    let mut stats = ReviewStatistics {
        total_prs: pull_requests.len(),
        total_assignments: assignment_counts.values().sum(),
        ..ReviewStatistics::default()
    };
    let mut active_reviews: BTreeMap<UserId, usize> = BTreeMap::new();

    for pull_request in pull_requests {
        let reviewers = tx.reviewers_of(pull_request.id())?;
        match pull_request.status() {
            PullRequestStatus::Open => {
                stats.open_prs += 1;
                if reviewers.is_empty() {
                    stats.open_without_reviewers += 1;
                }
                for reviewer in &reviewers {
                    *active_reviews.entry(reviewer.clone()).or_default() += 1;
                }
            }
            PullRequestStatus::Merged => stats.merged_prs += 1,
        }
        stats.pr_stats.push(PullRequestReviewStats {
            pull_request_id: pull_request.id().clone(),
            pull_request_name: pull_request.title().to_owned(),
            status: pull_request.status(),
            reviewers_count: reviewers.len(),
        });
    }

    stats.user_stats = users
        .into_iter()
        .map(|user| UserReviewStats {
            assignments_count: assignment_counts.get(user.id()).copied().unwrap_or_default(),
            active_reviews: active_reviews.get(user.id()).copied().unwrap_or_default(),
            user_id: user.id().clone(),
            username: user.name().to_owned(),
        })
        .collect();
    Ok(stats)
}

/// Statistics reporting service.
#[derive(Clone)]
pub struct StatisticsService<U>
where
    U: UnitOfWork,
{
    unit_of_work: Arc<U>,
}

impl<U> StatisticsService<U>
where
    U: UnitOfWork,
    U::Tx: UserStore + PullRequestStore + ReviewerStore,
{
    /// Creates a new statistics service.
    #[must_use]
    pub const fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }

    /// Returns counters and per-user and per-pull-request breakdowns from a
    /// single consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`super::ReviewError::Store`] when storage fails.
    pub async fn get_statistics(&self) -> ReviewResult<ReviewStatistics> {
        self.unit_of_work
            .within_transaction(collect_statistics_in)
            .await
            .inspect_err(|err| log_failure("get_statistics", err))
    }
}
