//! Team lifecycle: creation, membership, lookup, and deactivation cascade.

use super::error::{ReviewError, ReviewResult, log_failure};
use crate::review::{
    domain::{Team, TeamDeactivation, TeamMember, TeamName, User, UserId},
    ports::{PullRequestStore, ReviewerStore, TeamStore, UnitOfWork, UserStore},
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};

fn load_team<S>(tx: &mut S, team_name: &TeamName) -> ReviewResult<Team>
where
    S: TeamStore,
{
    let members = tx.find_team_members(team_name)?;
    if members.is_empty() {
        return Err(ReviewError::TeamNotFound(team_name.clone()));
    }
    Ok(Team::new(team_name.clone(), members)?)
}

/// Creates a team from a validated roster inside the caller's transaction.
///
/// # Errors
///
/// Returns [`ReviewError::TeamExists`] when the team already has members
/// and [`ReviewError::Store`] when storage fails.
pub fn add_team_in<S>(tx: &mut S, team: &Team) -> ReviewResult<Team>
where
    S: TeamStore,
{
    if tx.team_exists(team.name())? {
        return Err(ReviewError::TeamExists(team.name().clone()));
    }
    tx.upsert_users(team.members())?;
    info!(team = %team.name(), members = team.members().len(), "team created");
    load_team(tx, team.name())
}

/// Adds or moves one user onto an existing team.
///
/// # Errors
///
/// Returns [`ReviewError::TeamNotFound`] when the team has no members and
/// [`ReviewError::Store`] when storage fails.
pub fn add_team_member_in<S>(tx: &mut S, team_name: &TeamName, member: &User) -> ReviewResult<Team>
where
    S: TeamStore,
{
    if !tx.team_exists(team_name)? {
        return Err(ReviewError::TeamNotFound(team_name.clone()));
    }
    info!(team = %team_name, user_id = %member.id(), "team member added");
    tx.upsert_users(std::slice::from_ref(member))?;
    load_team(tx, team_name)
}

/// Deactivates every member of a team and strips their reviewer edges from
/// open pull requests, inside the caller's transaction.
///
/// No replacement reviewers are searched for; affected pull requests may be
/// left without reviewers.
///
/// # Errors
///
/// Returns [`ReviewError::TeamNotFound`] when the team has no members and
/// [`ReviewError::Store`] when storage fails.
pub fn deactivate_team_in<S>(tx: &mut S, team_name: &TeamName) -> ReviewResult<TeamDeactivation>
where
    S: TeamStore + UserStore + PullRequestStore + ReviewerStore,
{
    tx.claim_team(team_name)?;
    let members = tx.find_team_members(team_name)?;
    if members.is_empty() {
        return Err(ReviewError::TeamNotFound(team_name.clone()));
    }
    let member_ids: Vec<UserId> = members.iter().map(|member| member.id().clone()).collect();
    let member_set: BTreeSet<&UserId> = member_ids.iter().collect();

    let mut removed_assignments = 0;
    for pull_request in tx.find_open_reviewed_by_any(&member_ids)? {
        let reviewers = tx.reviewers_of(pull_request.id())?;
        let mut remaining = reviewers.len();
        for reviewer in reviewers.iter().filter(|id| member_set.contains(id)) {
            if tx.remove_reviewer(pull_request.id(), reviewer)? {
                removed_assignments += 1;
                remaining -= 1;
            }
        }
        if remaining == 0 {
            warn!(
                pull_request_id = %pull_request.id(),
                team = %team_name,
                "open pull request left without reviewers"
            );
        }
    }

    let deactivated_users = tx.deactivate_users(&member_ids)?;
    info!(
        team = %team_name,
        deactivated_users,
        removed_assignments,
        "team deactivated"
    );
    Ok(TeamDeactivation {
        team_name: team_name.clone(),
        deactivated_users,
        removed_assignments,
        member_ids,
    })
}

/// Team lifecycle orchestration service.
#[derive(Clone)]
pub struct TeamService<U>
where
    U: UnitOfWork,
{
    unit_of_work: Arc<U>,
}

impl<U> TeamService<U>
where
    U: UnitOfWork,
    U::Tx: TeamStore + UserStore + PullRequestStore + ReviewerStore,
{
    /// Creates a new team service.
    #[must_use]
    pub const fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }

    /// Creates a team and upserts its members.
    ///
    /// A member listed twice keeps its last declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Domain`] when the name is blank or `members` is
    /// empty; see [`add_team_in`] for the remaining cases.
    pub async fn add_team(&self, team_name: &str, members: Vec<TeamMember>) -> ReviewResult<Team> {
        self.create_team(team_name, members)
            .await
            .inspect_err(|err| log_failure("add_team", err))
    }

    async fn create_team(&self, team_name: &str, members: Vec<TeamMember>) -> ReviewResult<Team> {
        let team = Self::roster(team_name, members)?;
        self.unit_of_work
            .within_transaction(move |tx| add_team_in(tx, &team))
            .await
    }

    fn roster(team_name: &str, members: Vec<TeamMember>) -> ReviewResult<Team> {
        let name = TeamName::new(team_name)?;
        let unique: BTreeMap<UserId, TeamMember> = members
            .into_iter()
            .map(|member| (member.user_id.clone(), member))
            .collect();
        let users = unique
            .into_values()
            .map(|member| member.into_user(&name))
            .collect();
        Ok(Team::new(name, users)?)
    }

    /// Adds one member to an existing team.
    ///
    /// # Errors
    ///
    /// See [`add_team_member_in`].
    pub async fn add_team_member(
        &self,
        team_name: &TeamName,
        member: TeamMember,
    ) -> ReviewResult<Team> {
        let team = team_name.clone();
        let user = member.into_user(team_name);
        self.unit_of_work
            .within_transaction(move |tx| add_team_member_in(tx, &team, &user))
            .await
            .inspect_err(|err| log_failure("add_team_member", err))
    }

    /// Returns a team with its members ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamNotFound`] when the team has no members and
    /// [`ReviewError::Store`] when storage fails.
    pub async fn get_team(&self, team_name: &TeamName) -> ReviewResult<Team> {
        let team = team_name.clone();
        self.unit_of_work
            .within_transaction(move |tx| load_team(tx, &team))
            .await
    }

    /// Deactivates a whole team in one transaction.
    ///
    /// # Errors
    ///
    /// See [`deactivate_team_in`].
    pub async fn deactivate_team(&self, team_name: &TeamName) -> ReviewResult<TeamDeactivation> {
        let team = team_name.clone();
        self.unit_of_work
            .within_transaction(move |tx| deactivate_team_in(tx, &team))
            .await
            .inspect_err(|err| log_failure("deactivate_team", err))
    }
}
