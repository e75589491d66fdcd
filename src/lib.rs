// Library crate for the account service
// This file exposes the public API for integration tests

pub mod app;
pub mod config;
pub mod context;
pub mod generators;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use context::{ContextError, RequestContext};
pub use session::{InMemorySessionStore, RedisSessionStore, Session, SessionError, SessionStore};
pub use shared::{AppError, AppState};
pub use user::{InMemoryUserRepository, User, UserError, UserRepository};
