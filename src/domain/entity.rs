//! Stored records and the error type every layer reports through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A record the store assigns an id to (a coin, today)
pub trait Entity: Sized + Send + Sync + Clone {
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Store-assigned id; never changes once issued
    fn id(&self) -> Self::Id;
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure of a store call, independent of backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
