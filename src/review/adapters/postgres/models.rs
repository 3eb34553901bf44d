//! Diesel row models for reviewer assignment persistence.

use super::schema::{pull_request_reviewers, pull_requests, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query and insert row for users.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Team name, `None` when unaffiliated.
    pub team_name: Option<String>,
    /// Active flag.
    pub is_active: bool,
}

/// Query result row for pull requests.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pull_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PullRequestRow {
    /// Pull request identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author identifier.
    pub author_id: String,
    /// Status string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Insert model for pull requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pull_requests)]
pub struct NewPullRequestRow {
    /// Pull request identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author identifier.
    pub author_id: String,
    /// Status string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Insert model for reviewer edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pull_request_reviewers)]
pub struct NewReviewerRow<'a> {
    /// Pull request identifier.
    pub pr_id: &'a str,
    /// Reviewer identifier.
    pub reviewer_id: &'a str,
}
