use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Failures surfaced by the stores and the session coordinator.
///
/// A missing reply target or an empty like set is not an error; those are
/// represented as `None` / empty results.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Rejected before any store mutation.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("user '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("invalid username or PIN")]
    InvalidCredentials,

    #[error("message {0} is not editable by this session")]
    NotEditable(Uuid),

    /// Durable read/write failure. The enclosing operation was aborted.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ChatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn message_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("message {}", id))
    }
}
