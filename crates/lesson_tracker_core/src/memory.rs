//! crates/lesson_tracker_core/src/memory.rs
//!
//! In-process implementations of the storage ports. Used when no database is
//! configured and by the test suites. Nothing here survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{AuthSession, Item, ItemId, NewItem, User, UserCredentials};
use crate::ports::{CredentialStore, ItemRepository, PortError, PortResult, SessionStore};

fn lock<T>(mutex: &Mutex<T>) -> PortResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PortError::Unexpected("Mutex lock failed".to_string()))
}

//=========================================================================================
// Credentials
//=========================================================================================

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, UserCredentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<UserCredentials>> {
        Ok(lock(&self.users)?.get(username).cloned())
    }

    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let mut users = lock(&self.users)?;
        if users.contains_key(username) {
            return Err(PortError::Conflict(format!("username '{}' is taken", username)));
        }

        let creds = UserCredentials {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: creds.user_id,
            username: creds.username.clone(),
        };
        users.insert(creds.username.clone(), creds);
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<bool> {
        let mut users = lock(&self.users)?;
        let before = users.len();
        users.retain(|_, creds| creds.user_id != user_id);
        Ok(users.len() < before)
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, AuthSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: AuthSession) -> PortResult<()> {
        let mut sessions = lock(&self.sessions)?;
        if sessions.contains_key(&session.token) {
            return Err(PortError::Conflict("session token already exists".to_string()));
        }
        sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get(&self, token: &str) -> PortResult<Option<AuthSession>> {
        let now = Utc::now();
        Ok(lock(&self.sessions)?
            .get(token)
            .filter(|session| !session.is_expired_at(now))
            .cloned())
    }

    async fn remove(&self, token: &str) -> PortResult<()> {
        lock(&self.sessions)?.remove(token);
        Ok(())
    }

    async fn remove_by_user(&self, user_id: Uuid) -> PortResult<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

//=========================================================================================
// Items
//=========================================================================================

#[derive(Debug, Default)]
struct ItemTable {
    last_id: i64,
    rows: BTreeMap<ItemId, Item>,
}

/// Items keyed by id; the `BTreeMap` gives creation order for free since ids only grow.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    table: Mutex<ItemTable>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items across all owners.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: NewItem) -> PortResult<ItemId> {
        let mut table = lock(&self.table)?;
        table.last_id += 1;
        let id = ItemId(table.last_id);
        table.rows.insert(id, item.with_id(id));
        Ok(id)
    }

    async fn get(&self, id: ItemId) -> PortResult<Option<Item>> {
        Ok(lock(&self.table)?.rows.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Item>> {
        Ok(lock(&self.table)?
            .rows
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update(&self, item: &Item) -> PortResult<bool> {
        let mut table = lock(&self.table)?;
        match table.rows.get_mut(&item.id) {
            Some(row) => {
                *row = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ItemId) -> PortResult<bool> {
        Ok(lock(&self.table)?.rows.remove(&id).is_some())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> PortResult<u64> {
        let mut table = lock(&self.table)?;
        let before = table.rows.len();
        table.rows.retain(|_, item| item.owner_id != owner_id);
        Ok((before - table.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemState;
    use chrono::Duration;

    fn new_item(owner_id: Uuid) -> NewItem {
        NewItem {
            owner_id,
            kind: "homework".to_string(),
            lesson: "angielski".to_string(),
            date: Utc::now(),
            comment: "epic comment".to_string(),
            state: ItemState::Work,
        }
    }

    #[tokio::test]
    async fn update_does_not_resurrect_deleted_rows() {
        let repo = InMemoryItemRepository::new();
        let id = repo.insert(new_item(Uuid::new_v4())).await.unwrap();
        let mut item = repo.get(id).await.unwrap().unwrap();

        assert!(repo.delete(id).await.unwrap());
        item.state = ItemState::Done;

        assert!(!repo.update(&item).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(!repo.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryItemRepository::new();
        let owner = Uuid::new_v4();
        let first = repo.insert(new_item(owner)).await.unwrap();
        repo.delete(first).await.unwrap();

        let second = repo.insert(new_item(owner)).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn expired_sessions_read_as_absent_and_are_purged() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let live = AuthSession {
            token: "live".to_string(),
            user_id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
        };
        let stale = AuthSession {
            token: "stale".to_string(),
            expires_at: now - Duration::seconds(1),
            ..live.clone()
        };
        store.put(live.clone()).await.unwrap();
        store.put(stale).await.unwrap();

        assert!(store.get("stale").await.unwrap().is_none());
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("live").await.unwrap(), Some(live));
    }

    #[tokio::test]
    async fn deleting_a_user_frees_the_username() {
        let store = InMemoryCredentialStore::new();
        let user = store.create_user("rys", "hash").await.unwrap();

        assert!(store.delete_user(user.user_id).await.unwrap());
        assert!(store.find_by_username("rys").await.unwrap().is_none());
        assert!(!store.delete_user(user.user_id).await.unwrap());
        store.create_user("rys", "hash").await.unwrap();
    }

    #[tokio::test]
    async fn remove_by_user_only_touches_that_user() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let session = |token: &str, user_id: Uuid| AuthSession {
            token: token.to_string(),
            user_id,
            issued_at: now,
            expires_at: now + Duration::hours(1),
        };
        store.put(session("a1", alice)).await.unwrap();
        store.put(session("a2", alice)).await.unwrap();
        store.put(session("b1", Uuid::new_v4())).await.unwrap();

        assert_eq!(store.remove_by_user(alice).await.unwrap(), 2);
        assert!(store.get("a1").await.unwrap().is_none());
        assert!(store.get("b1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.create_user("rys", "hash").await.unwrap();

        assert!(matches!(
            store.create_user("rys", "other").await,
            Err(PortError::Conflict(_))
        ));
    }
}
