//! Users and the teams derived from them.

use super::{ReviewDomainError, TeamName, UserId};
use serde::{Deserialize, Serialize};

/// A person who can author pull requests and review them.
///
/// Users are never deleted; deactivation only clears [`User::is_active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    id: UserId,
    #[serde(rename = "username")]
    name: String,
    team_name: Option<TeamName>,
    is_active: bool,
}

impl User {
    /// Creates a user record.
    #[must_use]
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        team_name: Option<TeamName>,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            team_name,
            is_active,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the team the user belongs to, if any.
    #[must_use]
    pub const fn team_name(&self) -> Option<&TeamName> {
        self.team_name.as_ref()
    }

    /// Returns whether the user may author or review pull requests.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the user is a member of `team`.
    #[must_use]
    pub fn belongs_to(&self, team: &TeamName) -> bool {
        self.team_name.as_ref() == Some(team)
    }

    /// Sets the active flag.
    pub const fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

/// Membership declaration used when adding users to a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member identifier.
    pub user_id: UserId,
    /// Member display name.
    pub username: String,
    /// Whether the member is active on arrival.
    pub is_active: bool,
}

impl TeamMember {
    /// Creates a membership declaration from raw values.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyIdentifier`] when `user_id` is blank.
    pub fn new(
        user_id: &str,
        username: impl Into<String>,
        is_active: bool,
    ) -> Result<Self, ReviewDomainError> {
        Ok(Self {
            user_id: UserId::new(user_id)?,
            username: username.into(),
            is_active,
        })
    }

    /// Converts the declaration into a user on `team`.
    #[must_use]
    pub fn into_user(self, team: &TeamName) -> User {
        User::new(self.user_id, self.username, Some(team.clone()), self.is_active)
    }
}

/// A team: the non-empty set of users sharing a team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    team_name: TeamName,
    members: Vec<User>,
}

impl Team {
    /// Builds a team from its members, ordered by user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyTeam`] when `members` is empty; a
    /// team with zero members does not exist.
    pub fn new(team_name: TeamName, mut members: Vec<User>) -> Result<Self, ReviewDomainError> {
        if members.is_empty() {
            return Err(ReviewDomainError::EmptyTeam(team_name));
        }
        members.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(Self { team_name, members })
    }

    /// Returns the team name.
    #[must_use]
    pub const fn name(&self) -> &TeamName {
        &self.team_name
    }

    /// Returns the members ordered by identifier.
    #[must_use]
    pub fn members(&self) -> &[User] {
        &self.members
    }

    /// Returns the member identifiers ordered ascending.
    #[must_use]
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|member| member.id().clone()).collect()
    }
}
