//! Common state machine error types
//!
//! Shared by domain crates that implement state machines.

use thiserror::Error;

/// Errors raised while reading state machine values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Unknown state: {0}")]
    UnknownState(String),
}

impl From<StateError> for crate::Error {
    fn from(err: StateError) -> Self {
        // Only reachable from persisted rows
        crate::Error::Internal(err.to_string())
    }
}
