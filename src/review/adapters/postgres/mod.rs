//! `PostgreSQL` adapters for reviewer assignment persistence.

mod errors;
mod models;
mod schema;
mod store;
mod unit_of_work;

pub use unit_of_work::{PostgresUnitOfWork, ReviewPgPool, SCHEMA_SQL, apply_schema, build_pool};
