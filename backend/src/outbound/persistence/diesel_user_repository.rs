//! PostgreSQL-backed `UserRepository`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{DeliveryToken, LocalDate, User, UserDraft, UserId};

use super::error_mapping::{DieselFailure, classify, collect_rows};
use super::models::{DeliveryTokenRow, NewDeliveryTokenRow, UserRow, UserUpsertRow};
use super::pool::{DbPool, PoolError};
use super::schema::{user_delivery_tokens, users};

/// Diesel-backed user store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn map_failure(failure: DieselFailure) -> UserPersistenceError {
    if failure.is_connection() {
        UserPersistenceError::connection(failure.into_message())
    } else {
        UserPersistenceError::query(failure.into_message())
    }
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> UserPersistenceError {
    move |error| map_failure(classify(error, operation))
}

fn row_to_user(row: UserRow, tokens: Vec<String>) -> Result<User, String> {
    let delivery_tokens = tokens
        .into_iter()
        .map(|token| DeliveryToken::new(token).map_err(|err| err.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    User::new(UserDraft {
        id: UserId::from_uuid(row.id),
        name: row.display_name,
        email: row.email,
        time_zone: row.time_zone,
        delivery_tokens,
        last_reminded_on: row.last_reminded_on.map(LocalDate::from_naive),
    })
    .map_err(|err| format!("corrupted user row {}: {err}", row.id))
}

fn group_tokens(rows: Vec<DeliveryTokenRow>) -> BTreeMap<Uuid, Vec<String>> {
    let mut grouped: BTreeMap<Uuid, Vec<String>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.user_id).or_default().push(row.token);
    }
    grouped
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = UserUpsertRow {
            id: *user.id().as_uuid(),
            display_name: user.name(),
            email: user.email(),
            time_zone: user.time_zone(),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::display_name.eq(excluded(users::display_name)),
                users::email.eq(excluded(users::email)),
                users::time_zone.eq(excluded(users::time_zone)),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("upsert user"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find user"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let tokens: Vec<String> = user_delivery_tokens::table
            .filter(user_delivery_tokens::user_id.eq(id.as_uuid()))
            .order_by((user_delivery_tokens::created_at, user_delivery_tokens::token))
            .select(user_delivery_tokens::token)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("load delivery tokens"))?;
        row_to_user(row, tokens)
            .map(Some)
            .map_err(UserPersistenceError::query)
    }

    async fn list_with_delivery_tokens(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let token_rows: Vec<DeliveryTokenRow> = user_delivery_tokens::table
            .order_by((user_delivery_tokens::created_at, user_delivery_tokens::token))
            .select(DeliveryTokenRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list delivery tokens"))?;
        let mut tokens = group_tokens(token_rows);
        let ids: Vec<Uuid> = tokens.keys().copied().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(ids))
            .order_by(users::created_at)
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list users with tokens"))?;
        collect_rows(
            rows.into_iter().map(|row| {
                let held = tokens.remove(&row.id).unwrap_or_default();
                row_to_user(row, held)
            }),
            UserPersistenceError::query,
        )
    }

    async fn add_delivery_token(
        &self,
        id: &UserId,
        token: &DeliveryToken,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(user_delivery_tokens::table)
            .values(NewDeliveryTokenRow {
                user_id: *id.as_uuid(),
                token: token.as_ref(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("add delivery token"))?;
        Ok(inserted > 0)
    }

    async fn remove_delivery_tokens(
        &self,
        id: &UserId,
        tokens: &[DeliveryToken],
    ) -> Result<(), UserPersistenceError> {
        if tokens.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let values: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        diesel::delete(
            user_delivery_tokens::table
                .filter(user_delivery_tokens::user_id.eq(id.as_uuid()))
                .filter(user_delivery_tokens::token.eq_any(values)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error("remove delivery tokens"))?;
        Ok(())
    }

    async fn mark_reminded(&self, id: &UserId, on: LocalDate) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::last_reminded_on.eq(Some(on.as_naive())),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("mark reminded"))?;
        Ok(())
    }
}
