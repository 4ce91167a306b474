//! crates/lesson_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Repository-assigned identifier of a tracked item. Never supplied by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion state of an item. These are the only two values ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    Work,
    Done,
}

impl ItemState {
    /// The state reached by a single toggle.
    pub fn toggled(self) -> Self {
        match self {
            ItemState::Work => ItemState::Done,
            ItemState::Done => ItemState::Work,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Work => "work",
            ItemState::Done => "done",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item state '{0}'")]
pub struct UnknownItemState(pub String);

impl FromStr for ItemState {
    type Err = UnknownItemState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(ItemState::Work),
            "done" => Ok(ItemState::Done),
            other => Err(UnknownItemState(other.to_string())),
        }
    }
}

/// A tracked lesson record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: Uuid,
    pub kind: String,
    pub lesson: String,
    pub date: DateTime<Utc>,
    pub comment: String,
    pub state: ItemState,
}

/// A validated item that has not been stored yet, so it has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub owner_id: Uuid,
    pub kind: String,
    pub lesson: String,
    pub date: DateTime<Utc>,
    pub comment: String,
    pub state: ItemState,
}

impl NewItem {
    pub fn with_id(self, id: ItemId) -> Item {
        Item {
            id,
            owner_id: self.owner_id,
            kind: self.kind,
            lesson: self.lesson,
            date: self.date,
            comment: self.comment,
            state: self.state,
        }
    }
}

/// Raw, unvalidated input for creating an item, as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub kind: String,
    pub lesson: String,
    pub date: String,
    pub comment: String,
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

/// Represents a browser login session (auth cookie or bearer token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The authenticated caller, resolved from a session token on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn toggling_twice_returns_to_start() {
        assert_eq!(ItemState::Work.toggled(), ItemState::Done);
        assert_eq!(ItemState::Work.toggled().toggled(), ItemState::Work);
    }

    #[test]
    fn item_state_parses_only_known_values() {
        assert_eq!("done".parse::<ItemState>(), Ok(ItemState::Done));
        assert_eq!(
            "finished".parse::<ItemState>(),
            Err(UnknownItemState("finished".to_string()))
        );
    }

    #[test]
    fn session_expires_at_its_deadline() {
        let now = Utc::now();
        let session = AuthSession {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + Duration::seconds(5),
        };
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::seconds(5)));
    }
}
