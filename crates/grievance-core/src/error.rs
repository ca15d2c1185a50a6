//! Error types for Grievance

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("complaint not found: {0}")]
    NotFound(Uuid),

    #[error("complaint already escalated: {0}")]
    AlreadyEscalated(Uuid),

    /// Internal-only: the store retries id generation transparently.
    /// Callers never observe this variant from a public operation.
    #[error("duplicate complaint id: {0}")]
    DuplicateId(Uuid),

    /// Broken invariant inside the engine, e.g. id generation
    /// exhausting its retry budget. Not recoverable by the caller.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors the caller can recover from locally without
    /// the store having changed state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::AlreadyEscalated(_)
        )
    }
}
