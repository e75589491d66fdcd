use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    errors::UserError,
    models::{User, UserFilterAttrs, UserUpdateAttrs},
    password::PasswordHasher,
    repository::UserRepository,
    validate::{is_valid_email, is_valid_password, normalize_email},
};
use crate::context::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Profile changes requested for one user; `None` leaves the field alone
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Read, update and delete of existing accounts
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &RequestContext, user_id: &str) -> Result<User, UserError> {
        Ok(self
            .repository
            .find_one(ctx, &UserFilterAttrs::by_id(user_id))
            .await?)
    }

    #[instrument(skip(self, ctx, changes))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        changes: ProfileUpdate,
    ) -> Result<User, UserError> {
        let mut update = UserUpdateAttrs::default();

        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(UserError::EmailIncorrect);
            }
            update.email = Some(email);
        }

        if let Some(username) = changes.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(UserError::UsernameRequired);
            }
            update.username = Some(username.to_string());
        }

        if let Some(password) = changes.password {
            if !is_valid_password(&password) {
                return Err(UserError::PasswordIncorrect);
            }
            update.hashed_password = Some(self.hasher.hash(ctx, &password).await?);
        }

        if update == UserUpdateAttrs::default() {
            return Err(UserError::NoUpdateAttributes);
        }

        let user = self
            .repository
            .update(ctx, &update, &UserFilterAttrs::by_id(user_id))
            .await?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &RequestContext, user_id: &str) -> Result<DeleteResponse, UserError> {
        self.repository
            .delete(ctx, &UserFilterAttrs::by_id(user_id))
            .await?;

        info!(user_id = %user_id, "User deleted");
        Ok(DeleteResponse { success: true })
    }
}
