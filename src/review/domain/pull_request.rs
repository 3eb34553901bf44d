//! Pull request aggregate and its two-state lifecycle.

use super::{ParsePullRequestStatusError, PullRequestId, ReviewDomainError, UserId};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Fractional-second digits kept on timestamps; storage holds microseconds.
const TIMESTAMP_PRECISION: u16 = 6;

fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(TIMESTAMP_PRECISION)
}

/// Pull request review status.
///
/// `Open` is initial and `Merged` is terminal; there is no transition out of
/// `Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    /// Review is in progress.
    Open,
    /// The pull request has been merged.
    Merged,
}

impl PullRequestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl TryFrom<&str> for PullRequestStatus {
    type Error = ParsePullRequestStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(ParsePullRequestStatusError(value.to_owned())),
        }
    }
}

/// Result of asking a pull request to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The pull request moved from `Open` to `Merged`.
    Merged,
    /// The pull request was already merged and was left untouched.
    AlreadyMerged,
}

/// Pull request aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    id: PullRequestId,
    #[serde(rename = "pull_request_name")]
    title: String,
    author_id: UserId,
    status: PullRequestStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPullRequestData {
    /// Persisted identifier.
    pub id: PullRequestId,
    /// Persisted title.
    pub title: String,
    /// Persisted author identifier.
    pub author_id: UserId,
    /// Persisted status.
    pub status: PullRequestStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted merge timestamp, if merged.
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Opens a new pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyTitle`] when the title is blank.
    pub fn open(
        id: PullRequestId,
        title: impl Into<String>,
        author_id: UserId,
        clock: &impl Clock,
    ) -> Result<Self, ReviewDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(ReviewDomainError::EmptyTitle);
        }
        let timestamp = now(clock);
        Ok(Self {
            id,
            title: trimmed.to_owned(),
            author_id,
            status: PullRequestStatus::Open,
            created_at: timestamp,
            updated_at: timestamp,
            merged_at: None,
        })
    }

    /// Reconstructs a pull request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPullRequestData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            author_id: data.author_id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
            merged_at: data.merged_at,
        }
    }

    /// Returns the pull request identifier.
    #[must_use]
    pub const fn id(&self) -> &PullRequestId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the author identifier.
    #[must_use]
    pub const fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> PullRequestStatus {
        self.status
    }

    /// Returns whether the pull request reached its terminal state.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        matches!(self.status, PullRequestStatus::Merged)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the merge timestamp, if merged.
    #[must_use]
    pub const fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Merges the pull request.
    ///
    /// Merging is idempotent: an already merged pull request keeps its
    /// original `merged_at` and reports [`MergeOutcome::AlreadyMerged`].
    /// Timestamps are truncated to microseconds so a stored pull request
    /// reads back unchanged.
    pub fn merge(&mut self, clock: &impl Clock) -> MergeOutcome {
        if self.is_merged() {
            return MergeOutcome::AlreadyMerged;
        }
        let timestamp = now(clock);
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(timestamp);
        self.updated_at = timestamp;
        MergeOutcome::Merged
    }
}
