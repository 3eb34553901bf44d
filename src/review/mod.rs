//! Reviewer assignment for pull requests.
//!
//! Users are grouped into teams by team name. Opening a pull request assigns
//! up to two active teammates of the author; a reviewer can be swapped for
//! another teammate while the pull request is open; merging is idempotent;
//! deactivating a team strips its members from open reviews. Every
//! operation runs in one unit-of-work transaction. The module follows
//! hexagonal architecture:
//!
//! - Domain types and reviewer selection in [`domain`]
//! - Storage gateway and unit-of-work contracts in [`ports`]
//! - `PostgreSQL` and in-memory implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
