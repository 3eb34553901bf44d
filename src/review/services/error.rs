//! Service error taxonomy and its stable client-facing codes.

use crate::review::{
    domain::{PullRequestId, ReviewDomainError, TeamName, UserId},
    ports::StoreError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by review services.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The pull request does not exist.
    #[error("pull request {0} not found")]
    PullRequestNotFound(PullRequestId),

    /// The user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The author exists but is inactive.
    #[error("author {0} is inactive")]
    AuthorInactive(UserId),

    /// The author exists but belongs to no team.
    #[error("author {0} has no team")]
    AuthorWithoutTeam(UserId),

    /// No user belongs to the team.
    #[error("team {0} not found")]
    TeamNotFound(TeamName),

    /// A pull request with the same identifier already exists.
    #[error("pull request {0} already exists")]
    PullRequestExists(PullRequestId),

    /// The pull request is merged and can no longer change reviewers.
    #[error("cannot reassign on merged pull request {0}")]
    PullRequestMerged(PullRequestId),

    /// The reviewer is not assigned to the pull request.
    #[error("reviewer {reviewer} is not assigned to pull request {pull_request}")]
    NotAssigned {
        /// Pull request identifier.
        pull_request: PullRequestId,
        /// Reviewer identifier.
        reviewer: UserId,
    },

    /// No active teammate is eligible to replace the reviewer.
    #[error("no active replacement candidate for pull request {0}")]
    NoCandidate(PullRequestId),

    /// The team already has members.
    #[error("team {0} already exists")]
    TeamExists(TeamName),

    /// Input failed domain validation.
    #[error(transparent)]
    Domain(#[from] ReviewDomainError),

    /// Storage or transaction failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for review service operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Stable error codes reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A referenced entity does not exist or is not usable.
    NotFound,
    /// Pull request identifier already taken.
    PrExists,
    /// Pull request already merged.
    PrMerged,
    /// Reviewer not assigned to the pull request.
    NotAssigned,
    /// No replacement reviewer available.
    NoCandidate,
    /// Team already exists.
    TeamExists,
    /// Malformed input.
    BadRequest,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::TeamExists => "TEAM_EXISTS",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ReviewError {
    /// Returns the client-facing code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PullRequestNotFound(_)
            | Self::UserNotFound(_)
            | Self::AuthorInactive(_)
            | Self::AuthorWithoutTeam(_)
            | Self::TeamNotFound(_) => ErrorCode::NotFound,
            Self::PullRequestExists(_) => ErrorCode::PrExists,
            Self::PullRequestMerged(_) => ErrorCode::PrMerged,
            Self::NotAssigned { .. } => ErrorCode::NotAssigned,
            Self::NoCandidate(_) => ErrorCode::NoCandidate,
            Self::TeamExists(_) => ErrorCode::TeamExists,
            Self::Domain(_) => ErrorCode::BadRequest,
            Self::Store(_) => ErrorCode::Internal,
        }
    }

    /// Returns whether retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Builds the client payload. Storage details stay in the logs.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            Self::Store(_) => "internal error".to_owned(),
            other => other.to_string(),
        };
        ErrorBody {
            code: self.code(),
            message,
        }
    }
}

/// Logs a failed operation: storage failures at `error`, rule rejections at
/// `warn`.
pub(super) fn log_failure(operation: &'static str, err: &ReviewError) {
    match err {
        ReviewError::Store(store) => {
            error!(operation, error = %store, transient = store.is_transient(), "operation failed");
        }
        rejected => {
            warn!(operation, code = %rejected.code(), error = %rejected, "operation rejected");
        }
    }
}
