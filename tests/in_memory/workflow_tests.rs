//! End-to-end flows through the review services.

use super::helpers::{Services, active_roster, code_of, pr, seed_team, services, user};
use review_roster::review::{
    domain::{PullRequestStatus, TeamMember, TeamName},
    ports::{PullRequestStore, ReviewerStore},
    services::CreatePullRequestRequest,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backend_team_lifecycle(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3"]).await;

    let created = services
        .pull_requests
        .create_pull_request(CreatePullRequestRequest::new("pr-1", "Add search", "u1"))
        .await
        .expect("create");
    assert_eq!(created.reviewers(), [user("u2"), user("u3")]);

    let queue = services.users.get_review(&user("u2")).await.expect("queue");
    assert_eq!(queue.pull_requests.len(), 1);

    let blocked = services
        .pull_requests
        .reassign_reviewer(&pr("pr-1"), &user("u2"))
        .await;
    assert_eq!(code_of(blocked), "NO_CANDIDATE");

    let team = TeamName::new("backend").expect("team name");
    let newcomer = TeamMember::new("u4", "Dana", true).expect("member");
    services
        .teams
        .add_team_member(&team, newcomer)
        .await
        .expect("add member");

    let reassignment = services
        .pull_requests
        .reassign_reviewer(&pr("pr-1"), &user("u2"))
        .await
        .expect("reassign");
    assert_eq!(reassignment.replaced_by(), &user("u4"));
    assert_eq!(reassignment.review().reviewers(), [user("u3"), user("u4")]);

    let merged = services
        .pull_requests
        .merge_pull_request(&pr("pr-1"))
        .await
        .expect("merge");
    assert_eq!(merged.pull_request().status(), PullRequestStatus::Merged);

    let stats = services.statistics.get_statistics().await.expect("stats");
    assert_eq!(stats.total_prs, 1);
    assert_eq!(stats.merged_prs, 1);
    assert_eq!(stats.open_prs, 0);
    assert_eq!(stats.total_assignments, 2);

    let queue_after = services.users.get_review(&user("u2")).await.expect("queue");
    assert!(queue_after.pull_requests.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inactive_users_are_skipped_by_selection(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3", "u4"]).await;
    services
        .users
        .set_is_active(&user("u2"), false)
        .await
        .expect("deactivate u2");

    let created = services
        .pull_requests
        .create_pull_request(CreatePullRequestRequest::new("pr-1", "Fix cache", "u1"))
        .await
        .expect("create");
    assert_eq!(created.reviewers(), [user("u3"), user("u4")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_create_commits_nothing(services: Services) {
    services
        .teams
        .add_team(
            "backend",
            vec![
                TeamMember::new("u1", "Ada", false).expect("member"),
                TeamMember::new("u2", "Bo", true).expect("member"),
            ],
        )
        .await
        .expect("team");

    let rejected = services
        .pull_requests
        .create_pull_request(CreatePullRequestRequest::new("pr-1", "Sneaky", "u1"))
        .await;
    assert_eq!(code_of(rejected), "NOT_FOUND");

    let mut committed = services.unit_of_work.snapshot();
    assert!(committed.list_pull_requests().expect("list").is_empty());
    assert!(committed.reviewers_of(&pr("pr-1")).expect("reviewers").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_team_is_rejected_without_touching_members(services: Services) {
    seed_team(&services, "backend", &["u1", "u2"]).await;

    let duplicate = services
        .teams
        .add_team("backend", active_roster(&["u9"]))
        .await;
    assert_eq!(code_of(duplicate), "TEAM_EXISTS");

    let team = services
        .teams
        .get_team(&TeamName::new("backend").expect("team name"))
        .await
        .expect("team");
    assert_eq!(team.member_ids(), [user("u1"), user("u2")]);
}
