//! Shared utilities, configuration, and error handling for Atelier
//!
//! This crate provides common functionality used across the Atelier service:
//! - Configuration loaded from the environment
//! - Error types and their HTTP mapping
//! - Repository and state machine error types
//! - Request extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, LogFormat};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, QueryParams, ValidatedJson};
pub use state::StateError;
