//! Storage gateway implementation on a `PostgreSQL` connection.
//!
//! The traits are implemented on [`PgConnection`] itself: inside a unit of
//! work the connection is the open transaction, outside it a pooled
//! connection runs each statement on its own.

use super::{
    errors::store_error,
    models::{NewPullRequestRow, NewReviewerRow, PullRequestRow, UserRow},
    schema::{pull_request_reviewers, pull_requests, team_claims, users},
};
use crate::review::{
    domain::{
        PersistedPullRequestData, PullRequest, PullRequestId, PullRequestStatus, TeamName, User,
        UserId,
    },
    ports::{PullRequestStore, ReviewerStore, StoreError, StoreResult, TeamStore, UserStore},
};
use diesel::dsl::{count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use std::collections::BTreeMap;

fn row_to_user(row: UserRow) -> StoreResult<User> {
    let UserRow {
        id,
        username,
        team_name,
        is_active,
    } = row;
    let user_id = UserId::new(id).map_err(StoreError::persistence)?;
    let team = team_name
        .filter(|name| !name.trim().is_empty())
        .map(TeamName::new)
        .transpose()
        .map_err(StoreError::persistence)?;
    Ok(User::new(user_id, username, team, is_active))
}

fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().as_str().to_owned(),
        username: user.name().to_owned(),
        team_name: user.team_name().map(|team| team.as_str().to_owned()),
        is_active: user.is_active(),
    }
}

fn row_to_pull_request(row: PullRequestRow) -> StoreResult<PullRequest> {
    let data = PersistedPullRequestData {
        id: PullRequestId::new(row.id).map_err(StoreError::persistence)?,
        title: row.title,
        author_id: UserId::new(row.author_id).map_err(StoreError::persistence)?,
        status: PullRequestStatus::try_from(row.status.as_str())
            .map_err(StoreError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        merged_at: row.merged_at,
    };
    Ok(PullRequest::from_persisted(data))
}

fn to_new_row(pull_request: &PullRequest) -> NewPullRequestRow {
    NewPullRequestRow {
        id: pull_request.id().as_str().to_owned(),
        title: pull_request.title().to_owned(),
        author_id: pull_request.author_id().as_str().to_owned(),
        status: pull_request.status().as_str().to_owned(),
        created_at: pull_request.created_at(),
        updated_at: pull_request.updated_at(),
        merged_at: pull_request.merged_at(),
    }
}

fn rows_to_users(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
    rows.into_iter().map(row_to_user).collect()
}

fn rows_to_pull_requests(rows: Vec<PullRequestRow>) -> StoreResult<Vec<PullRequest>> {
    rows.into_iter().map(row_to_pull_request).collect()
}

fn id_strs(ids: &[UserId]) -> Vec<&str> {
    ids.iter().map(UserId::as_str).collect()
}

impl UserStore for PgConnection {
    fn find_user(&mut self, id: &UserId) -> StoreResult<Option<User>> {
        users::table
            .find(id.as_str())
            .select(UserRow::as_select())
            .first::<UserRow>(self)
            .optional()
            .map_err(store_error)?
            .map(row_to_user)
            .transpose()
    }

    fn find_active_candidates(
        &mut self,
        team: &TeamName,
        exclude: &[UserId],
    ) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::team_name.eq(team.as_str()))
            .filter(users::is_active.eq(true))
            .filter(users::id.ne_all(id_strs(exclude)))
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self)
            .map_err(store_error)?;
        rows_to_users(rows)
    }

    fn set_user_active(&mut self, id: &UserId, is_active: bool) -> StoreResult<bool> {
        let updated = diesel::update(users::table.find(id.as_str()))
            .set(users::is_active.eq(is_active))
            .execute(self)
            .map_err(store_error)?;
        Ok(updated > 0)
    }

    fn deactivate_users(&mut self, ids: &[UserId]) -> StoreResult<usize> {
        diesel::update(
            users::table
                .filter(users::id.eq_any(id_strs(ids)))
                .filter(users::is_active.eq(true)),
        )
        .set(users::is_active.eq(false))
        .execute(self)
        .map_err(store_error)
    }

    fn list_users(&mut self) -> StoreResult<Vec<User>> {
        let rows = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self)
            .map_err(store_error)?;
        rows_to_users(rows)
    }
}

impl TeamStore for PgConnection {
    fn team_exists(&mut self, team: &TeamName) -> StoreResult<bool> {
        diesel::select(exists(
            users::table.filter(users::team_name.eq(team.as_str())),
        ))
        .get_result::<bool>(self)
        .map_err(store_error)
    }

    fn find_team_members(&mut self, team: &TeamName) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::team_name.eq(team.as_str()))
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self)
            .map_err(store_error)?;
        rows_to_users(rows)
    }

    fn upsert_users(&mut self, users_to_write: &[User]) -> StoreResult<()> {
        for user in users_to_write {
            diesel::insert_into(users::table)
                .values(&user_to_row(user))
                .on_conflict(users::id)
                .do_update()
                .set((
                    users::username.eq(excluded(users::username)),
                    users::team_name.eq(excluded(users::team_name)),
                    users::is_active.eq(excluded(users::is_active)),
                ))
                .execute(self)
                .map_err(store_error)?;
        }
        Ok(())
    }

    fn claim_team(&mut self, team: &TeamName) -> StoreResult<()> {
        // Lock-only rows never conflict under Repeatable Read; bump a version.
        diesel::insert_into(team_claims::table)
            .values((
                team_claims::team_name.eq(team.as_str()),
                team_claims::version.eq(1_i64),
            ))
            .on_conflict(team_claims::team_name)
            .do_update()
            .set(team_claims::version.eq(team_claims::version + 1_i64))
            .execute(self)
            .map_err(store_error)?;
        Ok(())
    }
}

impl PullRequestStore for PgConnection {
    fn pull_request_exists(&mut self, id: &PullRequestId) -> StoreResult<bool> {
        diesel::select(exists(pull_requests::table.find(id.as_str())))
            .get_result::<bool>(self)
            .map_err(store_error)
    }

    fn find_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        pull_requests::table
            .find(id.as_str())
            .select(PullRequestRow::as_select())
            .first::<PullRequestRow>(self)
            .optional()
            .map_err(store_error)?
            .map(row_to_pull_request)
            .transpose()
    }

    fn lock_pull_request(&mut self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        pull_requests::table
            .find(id.as_str())
            .select(PullRequestRow::as_select())
            .for_update()
            .first::<PullRequestRow>(self)
            .optional()
            .map_err(store_error)?
            .map(row_to_pull_request)
            .transpose()
    }

    fn insert_pull_request(&mut self, pull_request: &PullRequest) -> StoreResult<()> {
        diesel::insert_into(pull_requests::table)
            .values(&to_new_row(pull_request))
            .execute(self)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::Duplicate(pull_request.id().to_string())
                }
                other => store_error(other),
            })?;
        Ok(())
    }

    fn update_pull_request_status(&mut self, pull_request: &PullRequest) -> StoreResult<()> {
        let updated = diesel::update(pull_requests::table.find(pull_request.id().as_str()))
            .set((
                pull_requests::status.eq(pull_request.status().as_str()),
                pull_requests::merged_at.eq(pull_request.merged_at()),
                pull_requests::updated_at.eq(pull_request.updated_at()),
            ))
            .execute(self)
            .map_err(store_error)?;
        if updated == 0 {
            return Err(StoreError::Conflict(format!(
                "pull request {} vanished",
                pull_request.id()
            )));
        }
        Ok(())
    }

    fn list_pull_requests(&mut self) -> StoreResult<Vec<PullRequest>> {
        let rows = pull_requests::table
            .order((pull_requests::created_at.desc(), pull_requests::id.asc()))
            .select(PullRequestRow::as_select())
            .load::<PullRequestRow>(self)
            .map_err(store_error)?;
        rows_to_pull_requests(rows)
    }

    fn find_open_reviewed_by_any(
        &mut self,
        reviewers: &[UserId],
    ) -> StoreResult<Vec<PullRequest>> {
        let rows = pull_requests::table
            .inner_join(pull_request_reviewers::table)
            .filter(pull_request_reviewers::reviewer_id.eq_any(id_strs(reviewers)))
            .filter(pull_requests::status.eq(PullRequestStatus::Open.as_str()))
            .select(PullRequestRow::as_select())
            .distinct()
            .order(pull_requests::id.asc())
            .load::<PullRequestRow>(self)
            .map_err(store_error)?;
        rows_to_pull_requests(rows)
    }

    fn find_reviewed_by(&mut self, reviewer: &UserId) -> StoreResult<Vec<PullRequest>> {
        let rows = pull_requests::table
            .inner_join(pull_request_reviewers::table)
            .filter(pull_request_reviewers::reviewer_id.eq(reviewer.as_str()))
            .order((pull_requests::created_at.desc(), pull_requests::id.asc()))
            .select(PullRequestRow::as_select())
            .load::<PullRequestRow>(self)
            .map_err(store_error)?;
        rows_to_pull_requests(rows)
    }
}

impl ReviewerStore for PgConnection {
    fn assign_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<()> {
        diesel::insert_into(pull_request_reviewers::table)
            .values(&NewReviewerRow {
                pr_id: pr.as_str(),
                reviewer_id: reviewer.as_str(),
            })
            .on_conflict_do_nothing()
            .execute(self)
            .map_err(store_error)?;
        Ok(())
    }

    fn reviewers_of(&mut self, pr: &PullRequestId) -> StoreResult<Vec<UserId>> {
        pull_request_reviewers::table
            .filter(pull_request_reviewers::pr_id.eq(pr.as_str()))
            .order(pull_request_reviewers::reviewer_id.asc())
            .select(pull_request_reviewers::reviewer_id)
            .load::<String>(self)
            .map_err(store_error)?
            .into_iter()
            .map(|id| UserId::new(id).map_err(StoreError::persistence))
            .collect()
    }

    fn is_assigned(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool> {
        diesel::select(exists(
            pull_request_reviewers::table
                .filter(pull_request_reviewers::pr_id.eq(pr.as_str()))
                .filter(pull_request_reviewers::reviewer_id.eq(reviewer.as_str())),
        ))
        .get_result::<bool>(self)
        .map_err(store_error)
    }

    fn replace_reviewer(
        &mut self,
        pr: &PullRequestId,
        old: &UserId,
        new: &UserId,
    ) -> StoreResult<()> {
        self.remove_reviewer(pr, old)?;
        diesel::insert_into(pull_request_reviewers::table)
            .values(&NewReviewerRow {
                pr_id: pr.as_str(),
                reviewer_id: new.as_str(),
            })
            .execute(self)
            .map_err(store_error)?;
        Ok(())
    }

    fn remove_reviewer(&mut self, pr: &PullRequestId, reviewer: &UserId) -> StoreResult<bool> {
        let removed = diesel::delete(
            pull_request_reviewers::table
                .filter(pull_request_reviewers::pr_id.eq(pr.as_str()))
                .filter(pull_request_reviewers::reviewer_id.eq(reviewer.as_str())),
        )
        .execute(self)
        .map_err(store_error)?;
        Ok(removed > 0)
    }

    fn reviewer_counts(&mut self) -> StoreResult<BTreeMap<UserId, usize>> {
        let rows = pull_request_reviewers::table
            .group_by(pull_request_reviewers::reviewer_id)
            .select((pull_request_reviewers::reviewer_id, count_star()))
            .load::<(String, i64)>(self)
            .map_err(store_error)?;
        rows.into_iter()
            .map(|(id, count)| {
                let reviewer = UserId::new(id).map_err(StoreError::persistence)?;
                let edges = usize::try_from(count).map_err(StoreError::persistence)?;
                Ok((reviewer, edges))
            })
            .collect()
    }
}
