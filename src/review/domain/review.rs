//! Read models returned by review operations.

use super::{PullRequest, TeamName, UserId};
use serde::{Deserialize, Serialize};

/// A pull request together with its currently assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedPullRequest {
    #[serde(flatten)]
    pull_request: PullRequest,
    #[serde(rename = "assigned_reviewers")]
    reviewers: Vec<UserId>,
}

impl ReviewedPullRequest {
    /// Pairs a pull request with its reviewer identifiers.
    #[must_use]
    pub const fn new(pull_request: PullRequest, reviewers: Vec<UserId>) -> Self {
        Self {
            pull_request,
            reviewers,
        }
    }

    /// Returns the pull request.
    #[must_use]
    pub const fn pull_request(&self) -> &PullRequest {
        &self.pull_request
    }

    /// Returns the assigned reviewers ordered by identifier.
    #[must_use]
    pub fn reviewers(&self) -> &[UserId] {
        &self.reviewers
    }
}

/// Outcome of replacing one reviewer on an open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerReassignment {
    #[serde(rename = "pr")]
    review: ReviewedPullRequest,
    replaced_by: UserId,
}

impl ReviewerReassignment {
    /// Creates a reassignment result.
    #[must_use]
    pub const fn new(review: ReviewedPullRequest, replaced_by: UserId) -> Self {
        Self {
            review,
            replaced_by,
        }
    }

    /// Returns the pull request with its updated reviewer list.
    #[must_use]
    pub const fn review(&self) -> &ReviewedPullRequest {
        &self.review
    }

    /// Returns the newly assigned reviewer.
    #[must_use]
    pub const fn replaced_by(&self) -> &UserId {
        &self.replaced_by
    }
}

/// Report of a team deactivation cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDeactivation {
    /// Team that was deactivated.
    pub team_name: TeamName,
    /// Number of members whose active flag flipped to `false`.
    pub deactivated_users: usize,
    /// Number of reviewer edges removed from open pull requests.
    pub removed_assignments: usize,
    /// Identifiers of every team member, ordered ascending.
    pub member_ids: Vec<UserId>,
}

/// Pull requests a user currently reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQueue {
    /// Reviewer identifier.
    pub user_id: UserId,
    /// Pull requests with an edge to the reviewer, newest first.
    pub pull_requests: Vec<PullRequest>,
}
