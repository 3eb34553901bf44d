//! Command-line front end for the review roster services.
//!
//! Usage:
//!
//! ```text
//! review-roster <command> [args]
//! ```
//!
//! Settings come from `REVIEW_ROSTER_*` environment variables. Every command
//! except `migrate` prints its result as JSON on standard output; rejected
//! operations print an error body such as
//!
//! ```json
//! { "code": "NO_CANDIDATE", "message": "no active replacement candidate for pull request pr-1" }
//! ```
//!
//! and exit with status 1.

use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use review_roster::config::{ConfigError, ReviewRosterSettings};
use review_roster::review::{
    adapters::postgres::{PostgresUnitOfWork, build_pool},
    domain::{PullRequestId, TeamMember, TeamName, UserId},
    ports::{PullRequestStore, ReviewerStore, StoreError, TeamStore, UnitOfWork, UserStore},
    services::{
        CreatePullRequestRequest, PullRequestService, ReviewError, StatisticsService,
        TeamService, UserService,
    },
};
use review_roster::telemetry::init_tracing;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("storage setup failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Reviewer assignment operations.
#[derive(Debug, Parser)]
#[command(name = "review-roster", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the review tables when missing.
    Migrate,
    /// Create a team; members are `id:name` or `id:name:inactive`.
    AddTeam {
        team: String,
        #[arg(long = "member", value_parser = parse_member, required = true)]
        members: Vec<TeamMember>,
    },
    /// Add or move one user onto an existing team.
    AddMember {
        team: String,
        #[arg(value_parser = parse_member)]
        member: TeamMember,
    },
    /// Show a team and its members.
    GetTeam { team: String },
    /// Deactivate every member and strip their open reviews.
    DeactivateTeam { team: String },
    /// Set a user's active flag.
    SetActive {
        user_id: String,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Open a pull request and assign reviewers.
    CreatePr {
        pull_request_id: String,
        title: String,
        author_id: String,
    },
    /// Merge a pull request.
    MergePr { pull_request_id: String },
    /// Replace one reviewer on an open pull request.
    Reassign {
        pull_request_id: String,
        old_reviewer_id: String,
    },
    /// Show one pull request, or every pull request when no id is given.
    Pr { pull_request_id: Option<String> },
    /// List the pull requests a user reviews.
    Reviews { user_id: String },
    /// Show review statistics.
    Stats,
}

fn parse_member(raw: &str) -> Result<TeamMember, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(user_id), Some(username)) = (parts.next(), parts.next()) else {
        return Err(format!("member '{raw}' must look like id:name[:inactive]"));
    };
    let is_active = match parts.next() {
        None | Some("active") => true,
        Some("inactive") => false,
        Some(other) => return Err(format!("unknown member state '{other}'")),
    };
    TeamMember::new(user_id, username, is_active).map_err(|err| err.to_string())
}

fn to_json(value: &impl Serialize) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

fn team_name(raw: &str) -> Result<TeamName, CliError> {
    TeamName::new(raw).map_err(|err| CliError::Review(err.into()))
}

fn user_id(raw: &str) -> Result<UserId, CliError> {
    UserId::new(raw).map_err(|err| CliError::Review(err.into()))
}

fn pull_request_id(raw: &str) -> Result<PullRequestId, CliError> {
    PullRequestId::new(raw).map_err(|err| CliError::Review(err.into()))
}

/// Runs one service command against `unit_of_work`.
async fn execute<U>(command: Command, unit_of_work: Arc<U>) -> Result<Value, CliError>
where
    U: UnitOfWork,
    U::Tx: UserStore + TeamStore + PullRequestStore + ReviewerStore,
{
    let pull_requests = PullRequestService::new(Arc::clone(&unit_of_work), Arc::new(DefaultClock));
    let teams = TeamService::new(Arc::clone(&unit_of_work));
    let users = UserService::new(Arc::clone(&unit_of_work));
    let statistics = StatisticsService::new(unit_of_work);

    match command {
        Command::Migrate => Ok(Value::Null),
        Command::AddTeam { team, members } => to_json(&teams.add_team(&team, members).await?),
        Command::AddMember { team, member } => {
            to_json(&teams.add_team_member(&team_name(&team)?, member).await?)
        }
        Command::GetTeam { team } => to_json(&teams.get_team(&team_name(&team)?).await?),
        Command::DeactivateTeam { team } => {
            to_json(&teams.deactivate_team(&team_name(&team)?).await?)
        }
        Command::SetActive { user_id: id, active } => {
            to_json(&users.set_is_active(&user_id(&id)?, active).await?)
        }
        Command::CreatePr {
            pull_request_id: id,
            title,
            author_id,
        } => {
            let request = CreatePullRequestRequest::new(id, title, author_id);
            to_json(&pull_requests.create_pull_request(request).await?)
        }
        Command::MergePr {
            pull_request_id: id,
        } => to_json(&pull_requests.merge_pull_request(&pull_request_id(&id)?).await?),
        Command::Reassign {
            pull_request_id: id,
            old_reviewer_id,
        } => to_json(
            &pull_requests
                .reassign_reviewer(&pull_request_id(&id)?, &user_id(&old_reviewer_id)?)
                .await?,
        ),
        Command::Pr {
            pull_request_id: Some(id),
        } => to_json(&pull_requests.find_pull_request(&pull_request_id(&id)?).await?),
        Command::Pr {
            pull_request_id: None,
        } => to_json(&pull_requests.list_pull_requests().await?),
        Command::Reviews { user_id: id } => to_json(&users.get_review(&user_id(&id)?).await?),
        Command::Stats => to_json(&statistics.get_statistics().await?),
    }
}

fn write_json(value: &impl Serialize) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout).map_err(CliError::Output)
}

async fn run(command: Command, settings: &ReviewRosterSettings) -> Result<(), CliError> {
    let pool = build_pool(settings.database_url()?, settings.max_connections())?;
    let unit_of_work = PostgresUnitOfWork::with_timeout(pool, settings.transaction_timeout());
    if matches!(command, Command::Migrate) {
        unit_of_work.migrate().await?;
        return Ok(());
    }
    let output = execute(command, Arc::new(unit_of_work)).await?;
    write_json(&output)
}

fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    let settings = ReviewRosterSettings::from_environment()?;
    init_tracing(settings.log_format()?);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeInit)?;

    match runtime.block_on(run(cli.command, &settings)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CliError::Review(err)) => {
            write_json(&err.to_body())?;
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
#[path = "review_roster_tests/mod.rs"]
mod tests;
