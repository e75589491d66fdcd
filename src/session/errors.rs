use thiserror::Error;

use crate::context::ContextError;
use crate::generators::IdError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session ttl must be positive and yield a representable expiry")]
    InvalidTtl,

    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to generate session id: {0}")]
    IdGeneration(#[from] IdError),

    #[error("session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session backend error: {0}")]
    Backend(String),
}
