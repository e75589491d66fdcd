use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::UserError,
    models::{User, UserFilterAttrs},
    password::PasswordHasher,
    repository::UserRepository,
    validate::{is_valid_email, normalize_email},
};
use crate::context::RequestContext;
use crate::session::{Session, SessionError, SessionStore};

/// Successful login: the account and the session just issued for it
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: User,
    pub session: Session,
}

/// Credential checks and the session lifecycle around them
#[derive(Clone)]
pub struct LoginService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    session_store: Arc<dyn SessionStore>,
}

impl LoginService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            repository,
            hasher,
            session_store,
        }
    }

    #[instrument(skip(self, ctx, password))]
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, UserError> {
        if email.is_empty() {
            return Err(UserError::EmailRequired);
        }
        if password.is_empty() {
            return Err(UserError::PasswordRequired);
        }

        // Emptiness is judged on the raw input; a blank email is malformed, not missing
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(UserError::EmailIncorrect);
        }

        let user = self
            .repository
            .find_one(ctx, &UserFilterAttrs::by_email(email))
            .await?;

        if let Err(e) = self.hasher.compare(ctx, &user.hashed_password, password).await {
            let err = UserError::from(e);
            warn!(user_id = %user.id, error = %err, "Login rejected");
            return Err(err);
        }

        let session = self.session_store.create(ctx, &user.id).await?;

        info!(user_id = %user.id, session_id = %session.id, "User logged in");
        Ok(LoginResponse { user, session })
    }

    /// Ends a session. A session that is already gone counts as logged out.
    #[instrument(skip(self, ctx))]
    pub async fn logout(&self, ctx: &RequestContext, session_id: &str) -> Result<(), UserError> {
        match self.session_store.delete(ctx, session_id).await {
            Ok(()) => {
                info!(session_id = %session_id, "User logged out");
                Ok(())
            }
            Err(SessionError::NotFound) | Err(SessionError::Expired) => {
                debug!(session_id = %session_id, "Logout for unknown session");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a session id to its live session
    #[instrument(skip(self, ctx))]
    pub async fn authenticate(&self, ctx: &RequestContext, session_id: &str) -> Result<Session, UserError> {
        Ok(self.session_store.get(ctx, session_id).await?)
    }
}
