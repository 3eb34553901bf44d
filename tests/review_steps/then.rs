//! Then steps for review BDD scenarios.

use super::world::{ReviewWorld, parse_pull_request_id, parse_user_ids, run_async};
use eyre::{WrapErr, ensure, eyre};
use review_roster::review::domain::{PullRequestStatus, UserId};
use rstest_bdd_macros::then;

fn reviewers_of(world: &ReviewWorld, pull_request: &str) -> Result<Vec<UserId>, eyre::Report> {
    let id = parse_pull_request_id(pull_request)?;
    let review = run_async(world.pull_requests.find_pull_request(&id))
        .wrap_err("load pull request")?;
    Ok(review.reviewers().to_vec())
}

#[then(r#"pull request "{pull_request}" has reviewers "{reviewers}""#)]
fn has_reviewers(
    world: &ReviewWorld,
    pull_request: String,
    reviewers: String,
) -> Result<(), eyre::Report> {
    let expected = parse_user_ids(&reviewers)?;
    let actual = reviewers_of(world, &pull_request)?;
    ensure!(actual == expected, "expected reviewers {expected:?}, found {actual:?}");
    Ok(())
}

#[then(r#"pull request "{pull_request}" has no reviewers"#)]
fn has_no_reviewers(world: &ReviewWorld, pull_request: String) -> Result<(), eyre::Report> {
    let actual = reviewers_of(world, &pull_request)?;
    ensure!(actual.is_empty(), "expected no reviewers, found {actual:?}");
    Ok(())
}

#[then(r#"pull request "{pull_request}" has status "{status}""#)]
fn has_status(world: &ReviewWorld, pull_request: String, status: String) -> Result<(), eyre::Report> {
    let expected = PullRequestStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let id = parse_pull_request_id(&pull_request)?;
    let review = run_async(world.pull_requests.find_pull_request(&id))
        .wrap_err("load pull request")?;
    ensure!(
        review.pull_request().status() == expected,
        "expected status {}, found {}",
        expected.as_str(),
        review.pull_request().status().as_str()
    );
    Ok(())
}

#[then(r#"the operation fails with code "{code}""#)]
fn fails_with_code(world: &ReviewWorld, code: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre!("expected a failed operation"))?;
    ensure!(
        err.code().as_str() == code,
        "expected code {code}, got {} ({err})",
        err.code()
    );
    Ok(())
}

#[then(r#"the replacement reviewer is "{reviewer}""#)]
fn replacement_is(world: &ReviewWorld, reviewer: String) -> Result<(), eyre::Report> {
    let reassignment = world
        .last_reassignment
        .as_ref()
        .ok_or_else(|| eyre!("missing reassignment result, last error: {:?}", world.last_error))?;
    ensure!(
        reassignment.replaced_by().as_str() == reviewer,
        "expected replacement {reviewer}, found {}",
        reassignment.replaced_by()
    );
    Ok(())
}

#[then("both merges report the same merge time")]
fn merges_agree(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let [first, second] = world.merges.as_slice() else {
        return Err(eyre!("expected two merges, found {}", world.merges.len()));
    };
    let merged_at = first.pull_request().merged_at();
    ensure!(merged_at.is_some(), "first merge did not set merged_at");
    ensure!(
        second.pull_request().merged_at() == merged_at,
        "second merge changed merged_at"
    );
    Ok(())
}

#[then("{users:usize} users were deactivated and {removed:usize} assignments removed")]
fn deactivation_counts(world: &ReviewWorld, users: usize, removed: usize) -> Result<(), eyre::Report> {
    let report = world
        .last_deactivation
        .as_ref()
        .ok_or_else(|| eyre!("missing deactivation report, last error: {:?}", world.last_error))?;
    ensure!(
        report.deactivated_users == users,
        "expected {users} deactivated users, found {}",
        report.deactivated_users
    );
    ensure!(
        report.removed_assignments == removed,
        "expected {removed} removed assignments, found {}",
        report.removed_assignments
    );
    Ok(())
}

#[then("{count:usize} open pull request is left without reviewers")]
fn open_without_reviewers(world: &ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let stats = run_async(world.statistics.get_statistics()).wrap_err("load statistics")?;
    ensure!(
        stats.open_without_reviewers == count,
        "expected {count} open pull requests without reviewers, found {}",
        stats.open_without_reviewers
    );
    Ok(())
}
