use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    errors::UserError,
    models::{User, UserAttrs, UserFilterAttrs},
    password::PasswordHasher,
    repository::{RepositoryError, UserRepository},
    validate::{is_valid_email, is_valid_password, normalize_email},
};
use crate::context::RequestContext;
use crate::generators::IdGenerator;

/// Creates accounts: validates input, checks availability, hashes, persists
#[derive(Clone)]
pub struct RegisterService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    id_generator: Arc<dyn IdGenerator>,
}

impl RegisterService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            repository,
            hasher,
            id_generator,
        }
    }

    #[instrument(skip(self, ctx, password))]
    pub async fn register(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        let email = normalize_email(email);
        let username = username.trim();

        if email.is_empty() {
            return Err(UserError::EmailRequired);
        }
        if password.is_empty() {
            return Err(UserError::PasswordRequired);
        }
        if username.is_empty() {
            return Err(UserError::UsernameRequired);
        }
        if !is_valid_email(&email) {
            return Err(UserError::EmailIncorrect);
        }
        if !is_valid_password(password) {
            return Err(UserError::PasswordIncorrect);
        }

        self.ensure_available(ctx, UserFilterAttrs::by_email(email.as_str()), UserError::EmailTaken)
            .await?;
        self.ensure_available(ctx, UserFilterAttrs::by_username(username), UserError::UsernameTaken)
            .await?;

        let id = self.id_generator.new_id(ctx).await?;
        let hashed_password = self.hasher.hash(ctx, password).await?;

        // A concurrent registration can still win the race; the repository's
        // uniqueness check reports it as the matching taken error.
        let user = self
            .repository
            .create(
                ctx,
                UserAttrs {
                    id,
                    username: username.to_string(),
                    email,
                    hashed_password,
                },
            )
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// `NotFound` means free; a hit is `taken`; anything else is a hard failure
    async fn ensure_available(
        &self,
        ctx: &RequestContext,
        filter: UserFilterAttrs,
        taken: UserError,
    ) -> Result<(), UserError> {
        match self.repository.find_one(ctx, &filter).await {
            Err(RepositoryError::NotFound) => Ok(()),
            Ok(_) => {
                warn!(error = %taken, "Registration rejected");
                Err(taken)
            }
            Err(e) => Err(e.into()),
        }
    }
}
