//! Unit tests for command parsing and dispatch.

use super::{CliError, Cli, Command, execute, parse_member};
use clap::Parser;
use review_roster::review::adapters::memory::InMemoryUnitOfWork;
use review_roster::review::services::ErrorCode;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;

#[fixture]
fn unit_of_work() -> Arc<InMemoryUnitOfWork> {
    Arc::new(InMemoryUnitOfWork::new())
}

async fn run(unit_of_work: &Arc<InMemoryUnitOfWork>, args: &[&str]) -> Result<Value, CliError> {
    let argv = std::iter::once("review-roster").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).expect("arguments should parse");
    execute(cli.command, Arc::clone(unit_of_work)).await
}

#[rstest]
#[case("u1:Alice", "u1", "Alice", true)]
#[case("u2:Bob:inactive", "u2", "Bob", false)]
#[case("u3:Carol:active", "u3", "Carol", true)]
fn parse_member_accepts_declared_states(
    #[case] raw: &str,
    #[case] id: &str,
    #[case] name: &str,
    #[case] active: bool,
) {
    let member = parse_member(raw).expect("member should parse");
    assert_eq!(member.user_id.as_str(), id);
    assert_eq!(member.username, name);
    assert_eq!(member.is_active, active);
}

#[rstest]
#[case("u1")]
#[case(":Alice")]
#[case("u1:Alice:retired")]
fn parse_member_rejects_malformed_values(#[case] raw: &str) {
    assert!(parse_member(raw).is_err());
}

#[rstest]
fn add_team_requires_a_member() {
    assert!(Cli::try_parse_from(["review-roster", "add-team", "backend"]).is_err());
}

#[rstest]
fn set_active_takes_an_explicit_flag() {
    let cli = Cli::try_parse_from(["review-roster", "set-active", "u1", "false"])
        .expect("arguments should parse");
    assert!(matches!(
        cli.command,
        Command::SetActive { active: false, .. }
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commands_drive_the_services(unit_of_work: Arc<InMemoryUnitOfWork>) {
    run(
        &unit_of_work,
        &["add-team", "backend", "--member", "u1:Alice", "--member", "u2:Bob", "--member", "u3:Carol"],
    )
    .await
    .expect("team should be created");

    let created = run(&unit_of_work, &["create-pr", "pr-1", "Add search", "u1"])
        .await
        .expect("pull request should be created");
    assert_eq!(created["status"], json!("OPEN"));
    assert_eq!(created["assigned_reviewers"], json!(["u2", "u3"]));

    let stats = run(&unit_of_work, &["stats"])
        .await
        .expect("statistics should load");
    assert_eq!(stats["total_assignments"], json!(2));

    let queue = run(&unit_of_work, &["reviews", "u2"])
        .await
        .expect("queue should load");
    assert_eq!(queue["pull_requests"][0]["pull_request_id"], json!("pr-1"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_commands_surface_review_errors(unit_of_work: Arc<InMemoryUnitOfWork>) {
    let err = run(&unit_of_work, &["merge-pr", "missing"])
        .await
        .expect_err("unknown pull request should fail");

    let CliError::Review(review) = err else {
        panic!("expected a review error, got {err:?}");
    };
    assert_eq!(review.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_identifiers_are_bad_requests(unit_of_work: Arc<InMemoryUnitOfWork>) {
    let err = run(&unit_of_work, &["get-team", "  "])
        .await
        .expect_err("blank team should fail");

    let CliError::Review(review) = err else {
        panic!("expected a review error, got {err:?}");
    };
    assert_eq!(review.code(), ErrorCode::BadRequest);
}
