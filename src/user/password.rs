use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::context::{ContextError, RequestContext};

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password does not match")]
    Mismatch,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("hashing worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// One-way salted password hashing
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Salted digest of `plaintext`, self-describing (algorithm, parameters and salt included)
    async fn hash(&self, ctx: &RequestContext, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(())` when `plaintext` matches `digest`, [`HashError::Mismatch`] when it does not
    async fn compare(&self, ctx: &RequestContext, digest: &str, plaintext: &str) -> Result<(), HashError>;
}

/// Argon2id with the crate's default parameters, producing PHC strings.
/// Work runs on the blocking pool and is abandoned if the request goes away.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, ctx: &RequestContext, plaintext: &str) -> Result<String, HashError> {
        ctx.check()?;

        let argon2 = self.argon2.clone();
        let plaintext = plaintext.to_owned();
        let task = tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|digest| digest.to_string())
                .map_err(|e| {
                    error!(error = %e, "argon2 hash_password error");
                    HashError::Hashing(e.to_string())
                })
        });

        ctx.run(task).await??
    }

    async fn compare(&self, ctx: &RequestContext, digest: &str, plaintext: &str) -> Result<(), HashError> {
        ctx.check()?;

        let argon2 = self.argon2.clone();
        let digest = digest.to_owned();
        let plaintext = plaintext.to_owned();
        let task = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest).map_err(|e| {
                error!(error = %e, "argon2 parse hash error");
                HashError::Hashing(e.to_string())
            })?;
            match argon2.verify_password(plaintext.as_bytes(), &parsed) {
                Ok(()) => Ok(()),
                Err(password_hash::Error::Password) => Err(HashError::Mismatch),
                Err(e) => Err(HashError::Hashing(e.to_string())),
            }
        });

        ctx.run(task).await??
    }
}
