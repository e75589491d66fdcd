use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{errors::SessionError, models::Session};
use crate::context::RequestContext;

/// Creates, resolves and invalidates sessions; owns TTL and expiry.
///
/// Per session id the lifecycle is absent -> active -> (expired | deleted):
/// - `create` stamps `expires_at = now + ttl` on a freshly generated id.
/// - `get` returns an active session. Backends report a session read after its
///   `expires_at` as [`SessionError::Expired`] or [`SessionError::NotFound`]
///   (see each backend), never as a valid session.
/// - `delete` removes an active or expired session and reports
///   [`SessionError::NotFound`] for unknown ids.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, ctx: &RequestContext, user_id: &str) -> Result<Session, SessionError>;
    async fn get(&self, ctx: &RequestContext, session_id: &str) -> Result<Session, SessionError>;
    async fn delete(&self, ctx: &RequestContext, session_id: &str) -> Result<(), SessionError>;

    /// Fixed lifetime given to every session this store creates
    fn ttl(&self) -> Duration;
}

/// Rejects non-positive TTLs, and TTLs whose expiry cannot be represented, at construction time
pub(crate) fn validate_ttl(ttl: Duration) -> Result<Duration, SessionError> {
    if ttl <= Duration::zero() || Utc::now().checked_add_signed(ttl).is_none() {
        return Err(SessionError::InvalidTtl);
    }
    Ok(ttl)
}
