//! Review Roster: reviewer assignment for pull requests.
//!
//! This crate assigns code reviewers to pull requests from the author's team,
//! swaps reviewers on request, merges idempotently, and cascades team
//! deactivation onto open reviews. Every operation runs inside a single
//! transaction against a shared relational store.
//!
//! # Architecture
//!
//! Review Roster follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and transactions
//! - **Adapters**: `PostgreSQL` and in-memory implementations of ports
//!
//! # Modules
//!
//! - [`review`]: Reviewer assignment bounded context
//! - [`config`]: Runtime settings
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod review;
pub mod telemetry;
