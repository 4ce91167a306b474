//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete PostgreSQL
//! implementation of the `CredentialStore`, `SessionStore` and `ItemRepository`
//! ports from the `core` crate, using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_tracker_core::domain::{AuthSession, Item, ItemId, ItemState, NewItem, User, UserCredentials};
use lesson_tracker_core::ports::{
    CredentialStore, ItemRepository, PortError, PortResult, SessionStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    password_hash: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            username: self.username,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    token: String,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            token: self.token,
            user_id: self.user_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct ItemRecord {
    id: i64,
    owner_id: Uuid,
    kind: String,
    lesson: String,
    date: DateTime<Utc>,
    comment: String,
    state: String,
}
impl ItemRecord {
    fn to_domain(self) -> PortResult<Item> {
        let state = self
            .state
            .parse::<ItemState>()
            .map_err(|e| PortError::Unexpected(format!("item {}: {}", self.id, e)))?;
        Ok(Item {
            id: ItemId(self.id),
            owner_id: self.owner_id,
            kind: self.kind,
            lesson: self.lesson,
            date: self.date,
            comment: self.comment,
            state,
        })
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(UserRecord::to_domain))
    }

    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (user_id, username, password_hash) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(username)
            .bind(hashed_password)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict(format!("username '{}' is taken", username))
                } else {
                    unexpected(e)
                }
            })?;

        Ok(User {
            user_id,
            username: username.to_string(),
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<bool> {
        // Sessions and items go with the user through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() == 1)
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn put(&self, session: AuthSession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, issued_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.issued_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("session token already exists".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(())
    }

    async fn get(&self, token: &str) -> PortResult<Option<AuthSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT token, user_id, issued_at, expires_at FROM auth_sessions
            WHERE token = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(SessionRecord::to_domain))
    }

    async fn remove(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn remove_by_user(&self, user_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `ItemRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ItemRepository for DbAdapter {
    async fn insert(&self, item: NewItem) -> PortResult<ItemId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO items (owner_id, kind, lesson, date, comment, state)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(item.owner_id)
        .bind(&item.kind)
        .bind(&item.lesson)
        .bind(item.date)
        .bind(&item.comment)
        .bind(item.state.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(ItemId(id))
    }

    async fn get(&self, id: ItemId) -> PortResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            "SELECT id, owner_id, kind, lesson, date, comment, state FROM items WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record.map(ItemRecord::to_domain).transpose()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, owner_id, kind, lesson, date, comment, state FROM items
            WHERE owner_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(ItemRecord::to_domain).collect()
    }

    async fn update(&self, item: &Item) -> PortResult<bool> {
        // id and owner_id are immutable, so they only appear in the WHERE clause.
        let result = sqlx::query(
            r#"
            UPDATE items SET kind = $3, lesson = $4, date = $5, comment = $6, state = $7
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(item.id.0)
        .bind(item.owner_id)
        .bind(&item.kind)
        .bind(&item.lesson)
        .bind(item.date)
        .bind(&item.comment)
        .bind(item.state.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: ItemId) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM items WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected())
    }
}
