//! Error types for review domain validation and parsing.

use super::TeamName;
use thiserror::Error;

/// Errors returned while constructing review domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDomainError {
    /// An identifier was empty after trimming.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Human-readable name of the identifier kind.
        kind: &'static str,
    },

    /// A pull request title was empty after trimming.
    #[error("pull request title must not be empty")]
    EmptyTitle,

    /// A team was declared without any members.
    #[error("team '{0}' must have at least one member")]
    EmptyTeam(TeamName),
}

/// Error returned while parsing pull request statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pull request status: {0}")]
pub struct ParsePullRequestStatusError(pub String);
