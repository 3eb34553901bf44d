//! Storage gateway implementation over an in-memory snapshot.

use crate::review::{
    domain::{PullRequest, PullRequestId, PullRequestStatus, TeamName, User, UserId},
    ports::{PullRequestStore, ReviewerStore, StoreError, StoreResult, TeamStore, UserStore},
};
use std::collections::{BTreeMap, BTreeSet};

/// Complete store contents.
///
/// The in-memory unit of work hands each transaction its own clone and
/// swaps it in on commit.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    users: BTreeMap<UserId, User>,
    pull_requests: BTreeMap<PullRequestId, PullRequest>,
    assignments: BTreeSet<(PullRequestId, UserId)>,
}

impl MemorySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(pull_requests: &mut [PullRequest]) {
    pull_requests.sort_by(|left, right| {
        right
            .created_at()
            .cmp(&left.created_at())
            .then_with(|| left.id().cmp(right.id()))
    });
}

impl UserStore for MemorySnapshot {
    fn find_user(&mut self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).cloned())
    }

    fn find_active_candidates(
        &mut self,
        team: &TeamName,
        exclude: &[UserId],
    ) -> StoreResult<Vec<User>> {
        Ok(self
            .users
            .values()
            .filter(|user| user.is_active() && user.belongs_to(team))
            .filter(|user| !exclude.contains(user.id()))
            .cloned()
            .collect())
    }

    fn set_user_active(&mut self, id: &UserId, is_active: bool) -> StoreResult<bool> {
        let Some(user) = self.users.get_mut(id) else {
            return Ok(false);
        };
        user.set_active(is_active);
        Ok(true)
    }

    fn deactivate_users(&mut self, ids: &[UserId]) -> StoreResult<usize> {
        let mut flipped = 0;
        for id in ids {
            if let Some(user) = self.users.get_mut(id).filter(|user| user.is_active()) {
                user.set_active(false);
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    fn list_users(&mut self) -> StoreResult<Vec<User>> {
        Ok(self.users.values().cloned().collect())
    }
}

impl TeamStore for MemorySnapshot {
    fn team_exists(&mut self, team: &TeamName) -> StoreResult<bool> {
        Ok(self.users.values().any(|user| user.belongs_to(team)))
    }

    fn find_team_members(&mut self, team: &TeamName) -> StoreResult<Vec<User>> {
        Ok(self
            .users
            .values()
            .filter(|user| user.belongs_to(team))
            .cloned()
            .collect())
    }

    fn upsert_users(&mut self, users: &[User]) -> StoreResult<()> {
        for user in users {
            self.users.insert(user.id().clone(), user.clone());
        }
        Ok(())
    }

    fn claim_team(&mut self, _team: &TeamName) -> StoreResult<()> {
        // Transactions never overlap on a snapshot.
        Ok(())
    }
}

impl PullRequestStore for MemorySnapshot {
    fn pull_request_exists(&mut self, id: &PullRequestId) -> StoreResult<bool> {
        Ok(self.pull_requests.contains_key(id))
    }

    fn find_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        Ok(self.pull_requests.get(id).cloned())
    }

    fn lock_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        // The whole snapshot is already exclusive to this transaction.
        self.find_pull_request(id)
    }

    fn insert_pull_request(&mut self, pull_request: &PullRequest) -> StoreResult<()> {
        if self.pull_requests.contains_key(pull_request.id()) {
            return Err(StoreError::Duplicate(pull_request.id().to_string()));
        }
        self.pull_requests
            .insert(pull_request.id().clone(), pull_request.clone());
        Ok(())
    }

    fn update_pull_request_status(&mut self, pull_request: &PullRequest) -> StoreResult<()> {
        let stored = self
            .pull_requests
            .get_mut(pull_request.id())
            .ok_or_else(|| {
                StoreError::Conflict(format!("pull request {} vanished", pull_request.id()))
            })?;
        *stored = pull_request.clone();
        Ok(())
    }

    fn list_pull_requests(&mut self) -> StoreResult<Vec<PullRequest>> {
        let mut all: Vec<PullRequest> = self.pull_requests.values().cloned().collect();
        newest_first(&mut all);
        Ok(all)
    }

    fn find_open_reviewed_by_any(
        &mut self,
        reviewers: &[UserId],
    ) -> StoreResult<Vec<PullRequest>> {
        let ids: BTreeSet<&PullRequestId> = self
            .assignments
            .iter()
            .filter(|(_, reviewer)| reviewers.contains(reviewer))
            .map(|(pr, _)| pr)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.pull_requests.get(id))
            .filter(|pr| pr.status() == PullRequestStatus::Open)
            .cloned()
            .collect())
    }

    fn find_reviewed_by(&mut self, reviewer: &UserId) -> StoreResult<Vec<PullRequest>> {
        let mut reviewed: Vec<PullRequest> = self
            .assignments
            .iter()
            .filter(|(_, assigned)| assigned == reviewer)
            .filter_map(|(pr, _)| self.pull_requests.get(pr).cloned())
            .collect();
        newest_first(&mut reviewed);
        Ok(reviewed)
    }
}

impl ReviewerStore for MemorySnapshot {
    fn assign_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<()> {
        self.assignments.insert((pr.clone(), reviewer.clone()));
        Ok(())
    }

    fn reviewers_of(&mut self, pr: &PullRequestId) -> StoreResult<Vec<UserId>> {
        Ok(self
            .assignments
            .iter()
            .filter(|(assigned_pr, _)| assigned_pr == pr)
            .map(|(_, reviewer)| reviewer.clone())
            .collect())
    }

    fn is_assigned(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool> {
        Ok(self.assignments.contains(&(pr.clone(), reviewer.clone())))
    }

    fn replace_reviewer(
        &mut self,
        pr: &PullRequestId,
        old: &UserId,
        new: &UserId,
    ) -> StoreResult<()> {
        let added = (pr.clone(), new.clone());
        if self.assignments.contains(&added) {
            return Err(StoreError::Conflict(format!(
                "reviewer {new} already assigned to {pr}"
            )));
        }
        self.assignments.remove(&(pr.clone(), old.clone()));
        self.assignments.insert(added);
        Ok(())
    }

    fn remove_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool> {
        Ok(self.assignments.remove(&(pr.clone(), reviewer.clone())))
    }

    fn reviewer_counts(&mut self) -> StoreResult<BTreeMap<UserId, usize>> {
        let mut counts = BTreeMap::new();
        for (_, reviewer) in &self.assignments {
            *counts.entry(reviewer.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
