pub mod domain;
pub mod memory;
pub mod ports;
pub mod services;

pub use domain::{AuthSession, Identity, Item, ItemDraft, ItemId, ItemState, NewItem, User, UserCredentials};
pub use ports::{CredentialStore, ItemRepository, PortError, PortResult, SessionStore};
pub use services::{AuthGate, ItemService, ServiceError, ServiceResult};
