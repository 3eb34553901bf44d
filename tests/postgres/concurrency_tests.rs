//! Row locking and uniqueness under contention.

use std::collections::BTreeSet;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use super::helpers::{TestSchema, pr, schema, user};
use diesel::PgConnection;
use mockable::DefaultClock;
use review_roster::review::{
    domain::{PullRequest, TeamName},
    ports::{TeamStore, UnitOfWork, UserStore},
    services::{CreatePullRequestRequest, ErrorCode, ReviewError, create_pull_request_in},
};
use rstest::rstest;
use tokio::task::JoinSet;

const HANDOFF: Duration = Duration::from_secs(10);

fn backend() -> TeamName {
    TeamName::new("backend").expect("valid team")
}

fn wait_for(signal: &mpsc::Receiver<()>) {
    tokio::task::block_in_place(|| signal.recv_timeout(HANDOFF)).expect("handoff signal");
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reassignments_keep_reviewers_distinct(schema: Option<TestSchema>) {
    let Some(db) = schema else { return };
    db.seed_team("backend", &["u1", "u2", "u3", "u4", "u5", "u6"]).await;
    let pull_requests = db.pull_requests();
    pull_requests
        .create_pull_request(CreatePullRequestRequest::new("pr-1", "Contested", "u1"))
        .await
        .expect("create");

    let mut tasks = JoinSet::new();
    for reviewer in ["u2", "u3"] {
        let service = Arc::clone(&pull_requests);
        tasks.spawn(async move { service.reassign_reviewer(&pr("pr-1"), &user(reviewer)).await });
    }
    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task joins") {
            Ok(_) => succeeded += 1,
            Err(err) => assert!(err.is_transient(), "unexpected failure: {err}"),
        }
    }
    assert!(succeeded >= 1);

    let review = pull_requests
        .find_pull_request(&pr("pr-1"))
        .await
        .expect("find");
    let reviewers: BTreeSet<_> = review.reviewers().iter().cloned().collect();
    assert_eq!(reviewers.len(), 2);
    assert!(!reviewers.contains(&user("u1")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_creates_admit_one(schema: Option<TestSchema>) {
    let Some(db) = schema else { return };
    db.seed_team("backend", &["u1", "u2", "u3"]).await;
    let pull_requests = db.pull_requests();

    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let service = Arc::clone(&pull_requests);
        tasks.spawn(async move {
            service
                .create_pull_request(CreatePullRequestRequest::new("pr-1", "Race", "u1"))
                .await
        });
    }
    let mut created = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task joins") {
            Ok(_) => created += 1,
            Err(err) => assert!(
                err.code() == ErrorCode::PrExists || err.is_transient(),
                "unexpected failure: {err}"
            ),
        }
    }
    assert_eq!(created, 1);

    let stats = db.statistics().get_statistics().await.expect("stats");
    assert_eq!(stats.total_prs, 1);
    assert_eq!(stats.total_assignments, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn create_on_a_stale_snapshot_loses_to_team_deactivation(schema: Option<TestSchema>) {
    let Some(db) = schema else { return };
    db.seed_team("backend", &["u1", "u2", "u3"]).await;
    let (snapshot_taken, on_snapshot) = mpsc::channel();
    let (deactivated, on_deactivated) = mpsc::channel();

    let unit_of_work = Arc::clone(&db.unit_of_work);
    let creating = tokio::spawn(async move {
        unit_of_work
            .within_transaction(move |tx: &mut PgConnection| {
                tx.find_user(&user("u1"))?;
                snapshot_taken.send(()).expect("test is waiting");
                on_deactivated.recv_timeout(HANDOFF).expect("deactivation signal");
                let pull_request =
                    PullRequest::open(pr("pr-1"), "Stale", user("u1"), &DefaultClock)?;
                create_pull_request_in(tx, pull_request)
            })
            .await
    });

    wait_for(&on_snapshot);
    db.teams()
        .deactivate_team(&backend())
        .await
        .expect("deactivation commits first");
    deactivated.send(()).expect("creator is waiting");

    let created: Result<_, ReviewError> = creating.await.expect("task joins");
    assert!(
        created.as_ref().is_err_and(ReviewError::is_transient),
        "stale create must conflict: {created:?}"
    );
    let missing = db
        .pull_requests()
        .find_pull_request(&pr("pr-1"))
        .await
        .expect_err("nothing was committed");
    assert_eq!(missing.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deactivation_after_a_claimed_create_strips_its_reviewers(schema: Option<TestSchema>) {
    let Some(db) = schema else { return };
    db.seed_team("backend", &["u1", "u2", "u3"]).await;
    let (claimed, on_claimed) = mpsc::channel();

    let unit_of_work = Arc::clone(&db.unit_of_work);
    let creating = tokio::spawn(async move {
        unit_of_work
            .within_transaction(move |tx: &mut PgConnection| {
                tx.claim_team(&backend())?;
                claimed.send(()).expect("test is waiting");
                std::thread::sleep(Duration::from_millis(500));
                let pull_request =
                    PullRequest::open(pr("pr-1"), "Claimed", user("u1"), &DefaultClock)?;
                create_pull_request_in(tx, pull_request)
            })
            .await
    });

    wait_for(&on_claimed);
    let teams = db.teams();
    let first_attempt = teams.deactivate_team(&backend()).await;
    let created: Result<_, ReviewError> = creating.await.expect("task joins");
    let created = created.expect("create holds the claim");
    assert_eq!(created.reviewers().len(), 2);

    match first_attempt {
        Ok(_) => {}
        Err(err) => {
            assert!(err.is_transient(), "unexpected failure: {err}");
            teams
                .deactivate_team(&backend())
                .await
                .expect("retry sees the new pull request");
        }
    }

    let review = db
        .pull_requests()
        .find_pull_request(&pr("pr-1"))
        .await
        .expect("find");
    assert!(review.reviewers().is_empty(), "stale reviewers: {:?}", review.reviewers());
}
