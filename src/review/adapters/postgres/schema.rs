//! Diesel schema for reviewer assignment persistence.

diesel::table! {
    /// Users; teams are derived from shared team names.
    users (id) {
        /// User identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Display name.
        #[max_length = 255]
        username -> Varchar,
        /// Team name, `NULL` when unaffiliated.
        #[max_length = 255]
        team_name -> Nullable<Varchar>,
        /// Whether the user may author or review pull requests.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Pull requests under review.
    pull_requests (id) {
        /// Externally supplied identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Title.
        title -> Text,
        /// Author user identifier.
        #[max_length = 255]
        author_id -> Varchar,
        /// `OPEN` or `MERGED`.
        #[max_length = 16]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Merge timestamp.
        merged_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Reviewer edges.
    pull_request_reviewers (pr_id, reviewer_id) {
        /// Pull request identifier.
        #[max_length = 255]
        pr_id -> Varchar,
        /// Reviewer user identifier.
        #[max_length = 255]
        reviewer_id -> Varchar,
    }
}

diesel::table! {
    /// Per-team row versions bumped by transactions that change a team's
    /// candidate pool or assign from it.
    team_claims (team_name) {
        /// Team name.
        #[max_length = 255]
        team_name -> Varchar,
        /// Number of committed claims.
        version -> Int8,
    }
}

diesel::joinable!(pull_request_reviewers -> pull_requests (pr_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    pull_requests,
    pull_request_reviewers,
    team_claims
);
