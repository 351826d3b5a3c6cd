use thiserror::Error;

use crate::chatbot::SessionId;
use crate::storage::Durability;

/// Errors from the persisted slot layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("slot '{key}' has schema version {found}, this build understands up to {supported}")]
    SchemaMismatch {
        key: String,
        found: u32,
        supported: u32,
    },
}

/// Malformed input rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
}

/// Errors from the entity and messaging stores.
///
/// Lookups that miss are not errors; they return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from reply generators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("no user message to reply to")]
    NothingToReply,

    #[error("reply generator unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the chatbot session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatbotError {
    #[error("chatbot session {0} not found")]
    SessionNotFound(SessionId),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The generator failed. The unanswered user message is kept in history;
    /// `durability` says whether it reached the slot store.
    #[error("reply failed: {source}")]
    Reply {
        source: ReplyError,
        durability: Durability,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
