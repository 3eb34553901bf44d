//! Deterministic reviewer selection.
//!
//! Selection is a pure prefix pick: active candidates outside the exclusion
//! set, ordered by user identifier, truncated to the quota. It does not
//! balance review load over time.

use super::{User, UserId};
use std::collections::BTreeSet;

/// Number of reviewers assigned when a pull request is created.
pub const CREATE_REVIEWER_QUOTA: usize = 2;

/// Number of reviewers picked to replace a departing reviewer.
pub const REASSIGN_REVIEWER_QUOTA: usize = 1;

/// Selects up to `quota` reviewer identifiers from `candidates`.
///
/// Inactive candidates and identifiers in `exclude` are skipped and
/// duplicates collapse. The result is ordered by identifier and has length
/// `min(quota, |pool|)`; an empty pool yields an empty list.
///
/// # Examples
///
///     use std::collections::BTreeSet;
///     use review_roster::review::domain::{User, UserId, select_reviewers};
///
///     let user = |id: &str| User::new(UserId::new(id).expect("valid"), id, None, true);
///     let candidates = vec![user("u3"), user("u1"), user("u2")];
///     let exclude = BTreeSet::from([UserId::new("u1").expect("valid")]);
///
///     let picked = select_reviewers(&candidates, &exclude, 1);
///     assert_eq!(picked, vec![UserId::new("u2").expect("valid")]);
#[must_use]
pub fn select_reviewers(
    candidates: &[User],
    exclude: &BTreeSet<UserId>,
    quota: usize,
) -> Vec<UserId> {
    candidates
        .iter()
        .filter(|candidate| candidate.is_active() && !exclude.contains(candidate.id()))
        .map(|candidate| candidate.id().clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(quota)
        .collect()
}
