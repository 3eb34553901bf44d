//! Shared helpers for in-memory review integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use review_roster::review::{
    adapters::memory::InMemoryUnitOfWork,
    domain::{PullRequestId, TeamMember, UserId},
    services::{
        PullRequestService, ReviewError, StatisticsService, TeamService, UserService,
    },
};
use rstest::fixture;

/// Services wired to one shared in-memory store.
pub struct Services {
    pub unit_of_work: Arc<InMemoryUnitOfWork>,
    pub pull_requests: Arc<PullRequestService<InMemoryUnitOfWork, DefaultClock>>,
    pub teams: TeamService<InMemoryUnitOfWork>,
    pub users: UserService<InMemoryUnitOfWork>,
    pub statistics: StatisticsService<InMemoryUnitOfWork>,
}

/// Provides services over an empty in-memory store.
#[fixture]
pub fn services() -> Services {
    let unit_of_work = Arc::new(InMemoryUnitOfWork::new());
    Services {
        pull_requests: Arc::new(PullRequestService::new(
            Arc::clone(&unit_of_work),
            Arc::new(DefaultClock),
        )),
        teams: TeamService::new(Arc::clone(&unit_of_work)),
        users: UserService::new(Arc::clone(&unit_of_work)),
        statistics: StatisticsService::new(Arc::clone(&unit_of_work)),
        unit_of_work,
    }
}

/// Builds an active roster from the given identifiers.
pub fn active_roster(ids: &[&str]) -> Vec<TeamMember> {
    ids.iter()
        .map(|id| TeamMember::new(id, format!("user {id}"), true))
        .collect::<Result<_, _>>()
        .expect("test identifiers are non-blank")
}

/// Parses a user identifier.
pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("test user id is non-blank")
}

/// Parses a pull request identifier.
pub fn pr(id: &str) -> PullRequestId {
    PullRequestId::new(id).expect("test pull request id is non-blank")
}

/// Creates a team and panics with context on failure.
pub async fn seed_team(services: &Services, team: &str, ids: &[&str]) {
    services
        .teams
        .add_team(team, active_roster(ids))
        .await
        .unwrap_or_else(|err| panic!("seed team {team}: {err}"));
}

/// Returns the error code string of a failed call.
pub fn code_of<T: std::fmt::Debug>(result: Result<T, ReviewError>) -> &'static str {
    result.expect_err("operation should fail").code().as_str()
}
