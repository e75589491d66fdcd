// Public API - what other modules can use
pub use cleanup_task::start_session_sweeper;
pub use cookie::{session_id_from, CookiePolicy, SESSION_COOKIE};
pub use errors::SessionError;
pub use memory_store::InMemorySessionStore;
pub use middleware::require_session;
pub use models::Session;
pub use redis_store::{RedisSessionStore, SessionKv};
pub use store::SessionStore;
pub use types::AuthenticatedUser;

// Internal modules
mod cleanup_task;
mod cookie;
mod errors;
mod memory_store;
mod middleware;
pub mod models;
mod redis_store;
mod store;
mod types;
