//! Database repositories for users and their token slots.

use super::decode_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listkeeper_auth::{CredentialStore, StoreError, TokenSlot, User};
use listkeeper_core::UserId;
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        if self.id <= 0 {
            return Err(decode_error(format!("invalid user id '{}'", self.id)));
        }
        Ok(User::with_all_fields(
            UserId::new(self.id),
            self.username,
            self.password_hash,
            self.first_name,
            self.last_name,
            self.created_at,
        ))
    }
}

/// Repository for user operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a user by their ID.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, first_name, last_name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    /// Finds a user by their unique username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, first_name, last_name, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    /// Creates a user with an already-hashed password.
    ///
    /// A duplicate username surfaces as a unique-violation database error.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, sqlx::Error> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, first_name, last_name, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;

        row.try_into_user()
    }

    /// Reads a named token.
    pub async fn get_token(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM user_tokens WHERE user_id = $1 AND name = $2")
            .bind(user_id.get())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// Writes (overwrites) a named token. Returns true if a row was written.
    pub async fn set_token(
        &self,
        user_id: UserId,
        name: &str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, name, value, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id, name)
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.get())
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a named token. Returns true if a row was deleted.
    pub async fn remove_token(&self, user_id: UserId, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND name = $2")
            .bind(user_id.get())
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// [`CredentialStore`] backed by the `users` and `user_tokens` tables.
#[derive(Clone)]
pub struct PgCredentialStore {
    users: UserRepository,
}

impl PgCredentialStore {
    /// Creates a store over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Returns the underlying user repository.
    pub fn users(&self) -> &UserRepository {
        &self.users
    }
}

fn store_error(e: sqlx::Error) -> Report<StoreError> {
    match e {
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => StoreError::Corrupt {
            details: e.to_string(),
        }
        .into(),
        _ => StoreError::Unavailable {
            details: e.to_string(),
        }
        .into(),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        self.users.find_by_id(id).await.map_err(store_error)
    }

    #[instrument(skip(self))]
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, Report<StoreError>> {
        self.users
            .find_by_username(username)
            .await
            .map_err(store_error)
    }

    async fn get_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<Option<String>, Report<StoreError>> {
        self.users
            .get_token(user_id, slot.as_str())
            .await
            .map_err(store_error)
    }

    #[instrument(skip(self, value))]
    async fn set_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
        value: &str,
    ) -> Result<bool, Report<StoreError>> {
        match self.users.set_token(user_id, slot.as_str(), value).await {
            Ok(written) => Ok(written),
            // Token row for a user that no longer exists.
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Ok(false),
            Err(e) => Err(store_error(e)),
        }
    }

    #[instrument(skip(self))]
    async fn remove_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<bool, Report<StoreError>> {
        self.users
            .remove_token(user_id, slot.as_str())
            .await
            .map_err(store_error)
    }
}
