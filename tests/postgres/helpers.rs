//! Shared helpers for `PostgreSQL` review integration tests.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool};
use mockable::DefaultClock;
use review_roster::review::{
    adapters::postgres::{PostgresUnitOfWork, apply_schema},
    domain::{PullRequestId, TeamMember, UserId},
    services::{PullRequestService, StatisticsService, TeamService},
};
use rstest::fixture;
use uuid::Uuid;

/// Environment variable naming an external test server.
pub const DATABASE_URL_ENV: &str = "REVIEW_ROSTER_TEST_DATABASE_URL";

/// Environment variable that turns cluster setup failures into skips.
const SKIP_CLUSTER_ENV: &str = "SKIP_TEST_CLUSTER";

/// Database holding the per-test schemas on the embedded cluster.
const EMBEDDED_DATABASE: &str = "postgres";

/// Pins every pooled connection to one schema.
#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, r2d2::Error> for SearchPath {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(r2d2::Error::QueryError)
    }
}

/// A private schema holding the review tables for one test.
pub struct TestSchema {
    database_url: String,
    name: String,
    pub unit_of_work: Arc<PostgresUnitOfWork>,
}

impl TestSchema {
    fn create(database_url: String) -> Self {
        let name = format!("review_test_{}", Uuid::new_v4().simple());
        let mut admin =
            PgConnection::establish(&database_url).expect("connect to test database");
        admin
            .batch_execute(&format!("CREATE SCHEMA {name}"))
            .expect("create test schema");

        let pool = Pool::builder()
            .max_size(8)
            .connection_customizer(Box::new(SearchPath(name.clone())))
            .build(ConnectionManager::<PgConnection>::new(&database_url))
            .expect("build test pool");
        let mut conn = pool.get().expect("checkout connection");
        apply_schema(&mut conn).expect("apply schema");
        drop(conn);

        Self {
            database_url,
            name,
            unit_of_work: Arc::new(PostgresUnitOfWork::new(pool)),
        }
    }

    /// Services sharing this schema's unit of work.
    pub fn pull_requests(&self) -> Arc<PullRequestService<PostgresUnitOfWork, DefaultClock>> {
        Arc::new(PullRequestService::new(
            Arc::clone(&self.unit_of_work),
            Arc::new(DefaultClock),
        ))
    }

    /// Team service over this schema.
    pub fn teams(&self) -> TeamService<PostgresUnitOfWork> {
        TeamService::new(Arc::clone(&self.unit_of_work))
    }

    /// Statistics service over this schema.
    pub fn statistics(&self) -> StatisticsService<PostgresUnitOfWork> {
        StatisticsService::new(Arc::clone(&self.unit_of_work))
    }

    /// Creates an active team.
    pub async fn seed_team(&self, team: &str, ids: &[&str]) {
        let roster = ids
            .iter()
            .map(|id| TeamMember::new(id, format!("user {id}"), true))
            .collect::<Result<Vec<_>, _>>()
            .expect("test identifiers are non-blank");
        self.teams()
            .add_team(team, roster)
            .await
            .unwrap_or_else(|err| panic!("seed team {team}: {err}"));
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        if let Ok(mut admin) = PgConnection::establish(&self.database_url) {
            let drop_sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name);
            let _cleanup = admin.batch_execute(&drop_sql);
        }
    }
}

fn skip_requested() -> bool {
    std::env::var(SKIP_CLUSTER_ENV)
        .is_ok_and(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Resolves the server URL, starting the shared embedded cluster when no
/// external server is configured.
///
/// # Panics
///
/// Panics when the embedded cluster cannot start, unless
/// `SKIP_TEST_CLUSTER` is truthy.
fn server_url() -> Option<String> {
    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        return Some(url);
    }
    match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
        Ok(cluster) => Some(cluster.connection().database_url(EMBEDDED_DATABASE)),
        Err(err) if skip_requested() => {
            tracing::warn!(error = ?err, "SKIP-TEST-CLUSTER: embedded cluster unavailable");
            None
        }
        Err(err) => panic!(
            "Test cluster setup failed: {err:?}. Set {DATABASE_URL_ENV} or {SKIP_CLUSTER_ENV}=1."
        ),
    }
}

/// Provides a fresh schema, or `None` when cluster setup failed and skipping
/// was requested.
#[fixture]
pub fn schema() -> Option<TestSchema> {
    server_url().map(TestSchema::create)
}

/// Parses a user identifier.
pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("test user id is non-blank")
}

/// Parses a pull request identifier.
pub fn pr(id: &str) -> PullRequestId {
    PullRequestId::new(id).expect("test pull request id is non-blank")
}
