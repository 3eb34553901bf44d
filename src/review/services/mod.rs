//! Application services for reviewer assignment.
//!
//! Each service opens one unit-of-work transaction per call. The `*_in`
//! functions hold the transactional bodies; code that already owns a
//! transaction handle calls them directly instead of nesting.

mod error;
mod pull_request;
mod statistics;
mod team;
mod user;

pub use error::{ErrorBody, ErrorCode, ReviewError, ReviewResult};
pub use pull_request::{
    CreatePullRequestRequest, PullRequestService, create_pull_request_in, find_pull_request_in,
    list_pull_requests_in, merge_pull_request_in, reassign_reviewer_in,
};
pub use statistics::{StatisticsService, collect_statistics_in};
pub use team::{TeamService, add_team_in, add_team_member_in, deactivate_team_in};
pub use user::{UserService, set_is_active_in};
