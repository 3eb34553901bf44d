//! Reporting snapshot over users, pull requests, and reviewer edges.

use super::{PullRequestId, PullRequestStatus, UserId};
use serde::{Deserialize, Serialize};

/// Per-user review load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReviewStats {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Reviewer edges currently held, on any pull request.
    pub assignments_count: usize,
    /// Reviewer edges held on open pull requests.
    pub active_reviews: usize,
}

/// Per-pull-request reviewer coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewStats {
    /// Pull request identifier.
    pub pull_request_id: PullRequestId,
    /// Pull request title.
    pub pull_request_name: String,
    /// Current status.
    pub status: PullRequestStatus,
    /// Number of assigned reviewers.
    pub reviewers_count: usize,
}

/// Aggregated review statistics taken from one consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatistics {
    /// Number of pull requests.
    pub total_prs: usize,
    /// Number of open pull requests.
    pub open_prs: usize,
    /// Number of merged pull requests.
    pub merged_prs: usize,
    /// Number of reviewer edges.
    pub total_assignments: usize,
    /// Open pull requests left without any reviewer.
    pub open_without_reviewers: usize,
    /// Per-user statistics ordered by user identifier.
    pub user_stats: Vec<UserReviewStats>,
    /// Per-pull-request statistics in listing order.
    pub pr_stats: Vec<PullRequestReviewStats>,
}
