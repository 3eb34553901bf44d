//! Concurrent writers against the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::helpers::{Services, pr, seed_team, services, user};
use review_roster::review::{
    domain::{PullRequestStatus, TeamName},
    services::{CreatePullRequestRequest, ErrorCode},
};
use rstest::rstest;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_distinct_ids_all_succeed(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3", "u4"]).await;

    let mut tasks = JoinSet::new();
    for index in 0..16 {
        let pull_requests = Arc::clone(&services.pull_requests);
        tasks.spawn(async move {
            let author = format!("u{}", index % 4 + 1);
            let request =
                CreatePullRequestRequest::new(format!("pr-{index}"), "Parallel change", author);
            pull_requests.create_pull_request(request).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let review = joined.expect("task joins").expect("create succeeds");
        assert_eq!(review.reviewers().len(), 2);
        assert!(
            !review
                .reviewers()
                .contains(review.pull_request().author_id())
        );
    }

    let stats = services.statistics.get_statistics().await.expect("stats");
    assert_eq!(stats.total_prs, 16);
    assert_eq!(stats.total_assignments, 32);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_one_id_admit_a_single_winner(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3"]).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let pull_requests = Arc::clone(&services.pull_requests);
        tasks.spawn(async move {
            let request = CreatePullRequestRequest::new("pr-1", "Contested change", "u1");
            pull_requests.create_pull_request(request).await
        });
    }
    let mut created = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task joins") {
            Ok(_) => created += 1,
            Err(err) => assert_eq!(err.code(), ErrorCode::PrExists),
        }
    }
    assert_eq!(created, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reassignments_never_double_assign(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3", "u4", "u5", "u6"]).await;
    let request = CreatePullRequestRequest::new("pr-1", "Contested review", "u1");
    services
        .pull_requests
        .create_pull_request(request)
        .await
        .expect("create");

    let mut tasks = JoinSet::new();
    for reviewer in ["u2", "u3"] {
        let pull_requests = Arc::clone(&services.pull_requests);
        tasks.spawn(async move {
            pull_requests
                .reassign_reviewer(&pr("pr-1"), &user(reviewer))
                .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("task joins").expect("reassign succeeds");
    }

    let review = services
        .pull_requests
        .find_pull_request(&pr("pr-1"))
        .await
        .expect("find");
    let reviewers: BTreeSet<_> = review.reviewers().iter().cloned().collect();
    assert_eq!(reviewers.len(), 2);
    assert!(!reviewers.contains(&user("u1")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_agree_on_merge_time(services: Services) {
    seed_team(&services, "backend", &["u1", "u2", "u3"]).await;
    let request = CreatePullRequestRequest::new("pr-1", "Ready change", "u1");
    services
        .pull_requests
        .create_pull_request(request)
        .await
        .expect("create");

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let pull_requests = Arc::clone(&services.pull_requests);
        tasks.spawn(async move { pull_requests.merge_pull_request(&pr("pr-1")).await });
    }
    let mut merge_times = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        let review = joined.expect("task joins").expect("merge succeeds");
        assert_eq!(review.pull_request().status(), PullRequestStatus::Merged);
        merge_times.insert(review.pull_request().merged_at());
    }
    assert_eq!(merge_times.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deactivation_racing_creates_leaves_no_inactive_reviewers(services: Services) {
    seed_team(&services, "frontend", &["f1", "f2", "f3"]).await;

    let mut creates = JoinSet::new();
    for index in 0..6 {
        let pull_requests = Arc::clone(&services.pull_requests);
        creates.spawn(async move {
            let request =
                CreatePullRequestRequest::new(format!("pr-{index}"), "Racing change", "f1");
            pull_requests.create_pull_request(request).await
        });
    }
    let team_name = TeamName::new("frontend").expect("team name");
    services
        .teams
        .deactivate_team(&team_name)
        .await
        .expect("deactivate");
    while let Some(joined) = creates.join_next().await {
        let outcome = joined.expect("task joins");
        if let Err(err) = outcome {
            assert_eq!(err.code(), ErrorCode::NotFound);
        }
    }

    let listed = services
        .pull_requests
        .list_pull_requests()
        .await
        .expect("list");
    for review in listed {
        assert!(
            review.reviewers().is_empty(),
            "{} kept reviewers after deactivation",
            review.pull_request().id()
        );
    }
}
