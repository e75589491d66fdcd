use accounts::{
    user::{HashError, PasswordHasher},
    RequestContext,
};
use async_trait::async_trait;

/// Deterministic, instant stand-in for argon2 so HTTP flows stay fast
pub struct FastHasher;

#[async_trait]
impl PasswordHasher for FastHasher {
    async fn hash(&self, ctx: &RequestContext, plaintext: &str) -> Result<String, HashError> {
        ctx.check()?;
        Ok(format!("fast${plaintext}"))
    }

    async fn compare(&self, ctx: &RequestContext, digest: &str, plaintext: &str) -> Result<(), HashError> {
        ctx.check()?;
        let expected = self.hash(ctx, plaintext).await?;
        if digest == expected {
            Ok(())
        } else {
            Err(HashError::Mismatch)
        }
    }
}
