//! In-memory adapters for reviewer assignment tests and local runs.

mod snapshot;
mod unit_of_work;

pub use snapshot::MemorySnapshot;
pub use unit_of_work::InMemoryUnitOfWork;
