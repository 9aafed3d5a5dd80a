//! Error types raised by repository implementations.

use thiserror::Error;
use word_core::RoundNumber;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("round repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("round {0} already exists")]
    Conflict(RoundNumber),

    #[error("repository task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
