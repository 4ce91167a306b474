//! crates/lesson_tracker_core/src/services/item_service.rs
//!
//! The item lifecycle: `create -> work`, `work <-> done` via toggle, and
//! permanent removal. Every operation is scoped to the calling identity.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::domain::{Identity, Item, ItemDraft, ItemId, ItemState, NewItem};
use crate::ports::ItemRepository;

const LOCK_STRIPES: usize = 64;

/// Accepts RFC 3339 timestamps as well as the bare `YYYY-MM-DD` and
/// `YYYY-MM-DDTHH:MM[:SS]` forms produced by HTML date inputs (read as UTC).
pub fn parse_item_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Striped async locks serializing read-modify-write sequences per item id.
/// Two ids may share a stripe; one id always maps to the same stripe.
struct ItemLocks {
    stripes: Vec<Mutex<()>>,
}

impl ItemLocks {
    fn new(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    async fn lock(&self, id: ItemId) -> MutexGuard<'_, ()> {
        let slot = id.0.rem_euclid(self.stripes.len() as i64) as usize;
        self.stripes[slot].lock().await
    }
}

pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
    locks: ItemLocks,
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self {
            repo,
            locks: ItemLocks::new(LOCK_STRIPES),
        }
    }

    /// All items owned by `identity`, in creation order.
    pub async fn list(&self, identity: &Identity) -> ServiceResult<Vec<Item>> {
        Ok(self.repo.list_by_owner(identity.user_id).await?)
    }

    /// Validates the draft and stores it as a new item in the `work` state.
    pub async fn create(&self, identity: &Identity, draft: ItemDraft) -> ServiceResult<Item> {
        if draft.lesson.trim().is_empty() {
            return Err(ServiceError::InvalidInput("lesson must not be empty".to_string()));
        }
        for (field, value) in [
            ("type", &draft.kind),
            ("lesson", &draft.lesson),
            ("comment", &draft.comment),
        ] {
            if value.contains('\0') {
                return Err(ServiceError::InvalidInput(format!(
                    "{} must not contain NUL characters",
                    field
                )));
            }
        }
        let date = parse_item_date(&draft.date).ok_or_else(|| {
            ServiceError::InvalidInput(format!("'{}' is not a valid date", draft.date))
        })?;

        let new_item = NewItem {
            owner_id: identity.user_id,
            kind: draft.kind,
            lesson: draft.lesson,
            date,
            comment: draft.comment,
            state: ItemState::Work,
        };
        let id = self.repo.insert(new_item.clone()).await?;

        info!(user_id = %identity.user_id, item_id = %id, "Created item");
        Ok(new_item.with_id(id))
    }

    /// Flips `work <-> done`. This is the only way an item's state changes.
    pub async fn toggle_state(&self, identity: &Identity, id: ItemId) -> ServiceResult<Item> {
        let _guard = self.locks.lock(id).await;

        let mut item = self.owned_item(identity, id).await?;
        item.state = item.state.toggled();
        if !self.repo.update(&item).await? {
            // Deleted through another process sharing the store.
            return Err(ServiceError::NotFound);
        }

        info!(user_id = %identity.user_id, item_id = %id, state = %item.state, "Toggled item");
        Ok(item)
    }

    /// Deletes the item. A second removal reports `NotFound`.
    pub async fn remove(&self, identity: &Identity, id: ItemId) -> ServiceResult<()> {
        let _guard = self.locks.lock(id).await;

        self.owned_item(identity, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound);
        }

        info!(user_id = %identity.user_id, item_id = %id, "Removed item");
        Ok(())
    }

    /// Drops every item of a deleted account. Returns how many went.
    pub async fn remove_all_owned_by(&self, owner_id: Uuid) -> ServiceResult<u64> {
        let removed = self.repo.delete_by_owner(owner_id).await?;
        info!(user_id = %owner_id, removed, "Removed all items of user");
        Ok(removed)
    }

    async fn owned_item(&self, identity: &Identity, id: ItemId) -> ServiceResult<Item> {
        let item = self.repo.get(id).await?.ok_or(ServiceError::NotFound)?;
        if item.owner_id != identity.user_id {
            debug!(user_id = %identity.user_id, item_id = %id, "Rejected access to foreign item");
            return Err(ServiceError::Forbidden);
        }
        Ok(item)
    }
}
