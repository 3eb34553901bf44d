//! Identifier types for users, teams, and pull requests.
//!
//! All identifiers are externally supplied strings. They are trimmed on
//! construction and must not be empty; ordering is lexicographic, which is
//! the order reviewer selection relies on.

use super::ReviewDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`ReviewDomainError::EmptyIdentifier`] when the value is
            /// blank.
            pub fn new(value: impl Into<String>) -> Result<Self, ReviewDomainError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ReviewDomainError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as `str`.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the owned string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ReviewDomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_identifier!(
    /// Globally unique user identifier.
    UserId,
    "user id"
);

string_identifier!(
    /// Team name shared by every member of the team.
    TeamName,
    "team name"
);

string_identifier!(
    /// Externally supplied pull request identifier.
    PullRequestId,
    "pull request id"
);
