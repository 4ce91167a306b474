//! crates/lesson_tracker_core/src/services/mod.rs
//!
//! Business rules that sit on top of the storage ports: the Auth Gate, which
//! owns session issuance and validation, and the Item Service, which owns the
//! item lifecycle.

pub mod auth_gate;
pub mod item_service;

pub use auth_gate::AuthGate;
pub use item_service::ItemService;

use crate::ports::PortError;

/// Typed failures returned by the Auth Gate and the Item Service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Unknown username or wrong password; the two are deliberately not told apart.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing, unknown or expired session")]
    Unauthenticated,
    #[error("Item belongs to another user")]
    Forbidden,
    #[error("Item not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
