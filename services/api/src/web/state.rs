//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lesson_tracker_core::ports::{CredentialStore, ItemRepository, SessionStore};
use lesson_tracker_core::{AuthGate, ItemService, ServiceResult, User};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate>,
    pub items: Arc<ItemService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the Auth Gate and the Item Service on top of the given storage ports.
    pub fn new(
        config: Arc<Config>,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        items: Arc<dyn ItemRepository>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthGate::new(credentials, sessions, config.session_ttl)),
            items: Arc::new(ItemService::new(items)),
            config,
        }
    }

    /// Removes an account together with its sessions and items.
    pub async fn delete_account(&self, username: &str) -> ServiceResult<User> {
        let user = self.auth.deprovision(username).await?;
        self.items.remove_all_owned_by(user.user_id).await?;
        Ok(user)
    }
}
