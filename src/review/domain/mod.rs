//! Domain model for reviewer assignment.
//!
//! Users form teams by sharing a team name, pull requests move one way from
//! open to merged, and reviewers are picked by a deterministic selection
//! function. Nothing here touches storage.

mod error;
mod ids;
mod pull_request;
mod review;
mod selection;
mod statistics;
mod user;

pub use error::{ParsePullRequestStatusError, ReviewDomainError};
pub use ids::{PullRequestId, TeamName, UserId};
pub use pull_request::{MergeOutcome, PersistedPullRequestData, PullRequest, PullRequestStatus};
pub use review::{ReviewQueue, ReviewedPullRequest, ReviewerReassignment, TeamDeactivation};
pub use selection::{CREATE_REVIEWER_QUOTA, REASSIGN_REVIEWER_QUOTA, select_reviewers};
pub use statistics::{PullRequestReviewStats, ReviewStatistics, UserReviewStats};
pub use user::{Team, TeamMember, User};
