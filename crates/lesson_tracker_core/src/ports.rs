//! crates/lesson_tracker_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the backing store (in-memory maps or PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuthSession, Item, ItemId, NewItem, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record already exists: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports (Traits)
//=========================================================================================

/// Username/password records, provisioned out-of-band.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<UserCredentials>>;

    /// Fails with `PortError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User>;

    /// Returns `false` if no such user exists.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<bool>;
}

/// Session lifetime. A `get` on an expired session behaves as absent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: AuthSession) -> PortResult<()>;

    async fn get(&self, token: &str) -> PortResult<Option<AuthSession>>;

    /// Removing an unknown token is not an error.
    async fn remove(&self, token: &str) -> PortResult<()>;

    /// Revokes every session of one user, returning how many went.
    async fn remove_by_user(&self, user_id: Uuid) -> PortResult<u64>;

    /// Deletes every session whose expiry is at or before `now`, returning how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> PortResult<u64>;
}

/// Whole-record storage for items. Holds no business rules.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Stores the item and returns its newly assigned, never reused id.
    async fn insert(&self, item: NewItem) -> PortResult<ItemId>;

    async fn get(&self, id: ItemId) -> PortResult<Option<Item>>;

    /// Items of one owner in creation order.
    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Item>>;

    /// Overwrites an existing record. Returns `false` if the id no longer exists,
    /// in which case nothing is written.
    async fn update(&self, item: &Item) -> PortResult<bool>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: ItemId) -> PortResult<bool>;

    async fn delete_by_owner(&self, owner_id: Uuid) -> PortResult<u64>;
}
