use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::context::RequestContext;
use crate::generators::IdGenerator;
use crate::session::{CookiePolicy, SessionStore};
use crate::user::{
    LoginService, PasswordHasher, RegisterService, UserError, UserRepository, UserService,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub register_service: RegisterService,
    pub login_service: LoginService,
    pub user_service: UserService,
    pub cookie_policy: CookiePolicy,
    pub request_timeout: Duration,
    /// Cancelled on server shutdown; every request context derives from it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        session_store: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            register_service: RegisterService::new(
                repository.clone(),
                hasher.clone(),
                id_generator,
            ),
            login_service: LoginService::new(repository.clone(), hasher.clone(), session_store),
            user_service: UserService::new(repository, hasher),
            cookie_policy: CookiePolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cookie_policy(mut self, cookie_policy: CookiePolicy) -> Self {
        self.cookie_policy = cookie_policy;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Fresh context for one request: cancelled on shutdown, bounded by the request timeout
    pub fn request_context(&self) -> RequestContext {
        RequestContext::child_of(&self.shutdown).with_timeout(self.request_timeout)
    }
}

/// Reuses the context the session middleware attached, or starts a new one
#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| state.request_context()))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Login failures: unknown email and wrong password are indistinguishable to the client
    pub fn credentials(err: UserError) -> Self {
        match err {
            UserError::UserNotFound | UserError::PasswordIncorrect => {
                AppError::Unauthorized("invalid credentials".to_string())
            }
            other => other.into(),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailRequired
            | UserError::PasswordRequired
            | UserError::UsernameRequired
            | UserError::EmailIncorrect
            | UserError::PasswordIncorrect
            | UserError::NoUpdateAttributes => AppError::BadRequest(err.to_string()),
            UserError::EmailTaken | UserError::UsernameTaken => AppError::Conflict(err.to_string()),
            UserError::UserNotFound => AppError::NotFound(err.to_string()),
            UserError::SessionNotFound | UserError::SessionExpired => {
                AppError::Unauthorized("not authorized".to_string())
            }
            UserError::Context(_) | UserError::Internal(_) => {
                error!(error = %err, "Request failed");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest("invalid request".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::generators::UuidIdGenerator;
    use crate::session::InMemorySessionStore;
    use crate::user::{
        HashError, InMemoryUserRepository, RepositoryError, User, UserAttrs, UserFilterAttrs,
        UserUpdateAttrs,
    };

    /// Reversible stand-in for argon2 so service tests stay fast
    pub struct PlainTextHasher;

    #[async_trait]
    impl PasswordHasher for PlainTextHasher {
        async fn hash(&self, ctx: &RequestContext, plaintext: &str) -> Result<String, HashError> {
            ctx.check()?;
            Ok(format!("plain${plaintext}"))
        }

        async fn compare(&self, ctx: &RequestContext, digest: &str, plaintext: &str) -> Result<(), HashError> {
            ctx.check()?;
            if digest == format!("plain${plaintext}") {
                Ok(())
            } else {
                Err(HashError::Mismatch)
            }
        }
    }

    /// Repository whose every call fails like an unreachable database
    pub struct FailingUserRepository;

    #[async_trait]
    impl UserRepository for FailingUserRepository {
        async fn create(&self, _ctx: &RequestContext, _attrs: UserAttrs) -> Result<User, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_one(&self, _ctx: &RequestContext, _filter: &UserFilterAttrs) -> Result<User, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find(&self, _ctx: &RequestContext, _filter: &UserFilterAttrs) -> Result<Vec<User>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn update(
            &self,
            _ctx: &RequestContext,
            _update: &UserUpdateAttrs,
            _filter: &UserFilterAttrs,
        ) -> Result<User, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn delete(&self, _ctx: &RequestContext, _filter: &UserFilterAttrs) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        repository: Option<Arc<dyn UserRepository>>,
        session_store: Option<Arc<dyn SessionStore>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                repository: None,
                session_store: None,
            }
        }

        pub fn with_repository(mut self, repository: Arc<dyn UserRepository>) -> Self {
            self.repository = Some(repository);
            self
        }

        pub fn with_session_store(mut self, session_store: Arc<dyn SessionStore>) -> Self {
            self.session_store = Some(session_store);
            self
        }

        pub fn build(self) -> AppState {
            let id_generator: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator::new());
            let session_store = match self.session_store {
                Some(store) => store,
                None => Arc::new(
                    InMemorySessionStore::new(chrono::Duration::hours(1), id_generator.clone())
                        .unwrap(),
                ),
            };

            AppState::new(
                self.repository
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                session_store,
                Arc::new(PlainTextHasher),
                id_generator,
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
