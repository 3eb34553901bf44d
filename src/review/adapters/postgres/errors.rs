//! Diesel error mapping for reviewer assignment storage.

use crate::review::ports::StoreError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Maps a Diesel error onto the storage gateway taxonomy.
///
/// Serialization failures, deadlocks, and unique-key races between
/// concurrent transactions are transient conflicts; a cancelled statement is
/// a timeout.
pub(super) fn store_error(error: DieselError) -> StoreError {
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
    }

    match error {
        DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure | DatabaseErrorKind::UniqueViolation,
            info,
        ) => StoreError::Conflict(info.message().to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            StoreError::Connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, ref info) if info.message().contains("deadlock detected") => {
            StoreError::Conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(_, ref info)
            if info.message().contains("statement timeout") =>
        {
            StoreError::Timeout
        }
        other => StoreError::persistence(other),
    }
}
