use thiserror::Error;

use super::password::HashError;
use super::repository::RepositoryError;
use crate::context::ContextError;
use crate::generators::IdError;
use crate::session::SessionError;

/// Outcome kinds of the account services. Validation, conflict, not-found and
/// auth variants carry fixed messages; `Context` and `Internal` are infrastructure failures.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("email is required")]
    EmailRequired,

    #[error("password is required")]
    PasswordRequired,

    #[error("username is required")]
    UsernameRequired,

    #[error("incorrect email")]
    EmailIncorrect,

    #[error("incorrect password")]
    PasswordIncorrect,

    #[error("no update attributes provided")]
    NoUpdateAttributes,

    #[error("email already in use")]
    EmailTaken,

    #[error("username already in use")]
    UsernameTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("session is expired")]
    SessionExpired,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => UserError::UserNotFound,
            RepositoryError::EmailTaken => UserError::EmailTaken,
            RepositoryError::UsernameTaken => UserError::UsernameTaken,
            RepositoryError::NoUpdateAttrs => UserError::NoUpdateAttributes,
            RepositoryError::Context(e) => UserError::Context(e),
            other => UserError::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for UserError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => UserError::SessionNotFound,
            SessionError::Expired => UserError::SessionExpired,
            SessionError::Context(e) => UserError::Context(e),
            other => UserError::Internal(other.to_string()),
        }
    }
}

impl From<HashError> for UserError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Mismatch => UserError::PasswordIncorrect,
            HashError::Context(e) => UserError::Context(e),
            other => UserError::Internal(other.to_string()),
        }
    }
}

impl From<IdError> for UserError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::Context(e) => UserError::Context(e),
            other => UserError::Internal(other.to_string()),
        }
    }
}
