use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::context::{ContextError, RequestContext};

#[derive(Debug, Error)]
pub enum IdError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("id generation failed: {0}")]
    Generation(String),
}

/// Trait for generating identifiers for users and sessions
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn new_id(&self, ctx: &RequestContext) -> Result<String, IdError>;
}

/// Random (v4) UUID generator, hyphenated lowercase form
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UuidIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdGenerator for UuidIdGenerator {
    async fn new_id(&self, ctx: &RequestContext) -> Result<String, IdError> {
        ctx.check()?;
        Ok(Uuid::new_v4().to_string())
    }
}
