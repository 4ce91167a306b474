//! services/api/src/lib.rs
//!
//! HTTP boundary of the lesson tracker: configuration, storage adapters and
//! the axum router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod sweeper;
pub mod web;
