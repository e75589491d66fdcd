use async_trait::async_trait;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::SessionError,
    models::Session,
    store::{validate_ttl, SessionStore},
};
use crate::context::RequestContext;
use crate::generators::IdGenerator;

/// Minimal key/value surface the networked store needs from its backend
#[async_trait]
pub trait SessionKv: Send + Sync {
    /// Stores `value` under `key`, letting the backend drop it after `ttl_ms`
    async fn set_with_ttl(&self, key: &str, value: String, ttl_ms: u64) -> Result<(), SessionError>;
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    /// Returns whether a key was actually removed
    async fn del(&self, key: &str) -> Result<bool, SessionError>;
}

fn backend_error(err: redis::RedisError) -> SessionError {
    SessionError::Backend(err.to_string())
}

#[async_trait]
impl SessionKv for ConnectionManager {
    async fn set_with_ttl(&self, key: &str, value: String, ttl_ms: u64) -> Result<(), SessionError> {
        let mut conn = self.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.clone();
        let value: Option<String> = AsyncCommands::get(&mut conn, key)
            .await
            .map_err(backend_error)?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<bool, SessionError> {
        let mut conn = self.clone();
        let removed: u64 = AsyncCommands::del(&mut conn, key)
            .await
            .map_err(backend_error)?;
        Ok(removed > 0)
    }
}

/// Session store backed by a shared key/value server.
///
/// Each session is stored as JSON under `session:<id>` with the backend's own
/// expiry set to the session TTL, so other replicas of the service see the
/// same sessions. A record that outlived its embedded `expires_at` (clock skew
/// between replicas) is reported as not found.
pub struct RedisSessionStore {
    kv: Arc<dyn SessionKv>,
    ttl: Duration,
    id_generator: Arc<dyn IdGenerator>,
}

impl RedisSessionStore {
    pub fn new(
        kv: Arc<dyn SessionKv>,
        ttl: Duration,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            kv,
            ttl: validate_ttl(ttl)?,
            id_generator,
        })
    }

    /// Opens a managed (auto-reconnecting) connection to `url`
    #[instrument(skip(url, id_generator))]
    pub async fn connect(
        url: &str,
        ttl: Duration,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Result<Self, SessionError> {
        let ttl = validate_ttl(ttl)?;
        let client = redis::Client::open(url).map_err(backend_error)?;
        let manager = client.get_connection_manager().await.map_err(backend_error)?;

        info!("Connected to session backend");
        Self::new(Arc::new(manager), ttl, id_generator)
    }

    pub fn session_key(session_id: &str) -> String {
        format!("session:{session_id}")
    }

    fn ttl_millis(&self) -> u64 {
        self.ttl.num_milliseconds().max(1) as u64
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, ctx))]
    async fn create(&self, ctx: &RequestContext, user_id: &str) -> Result<Session, SessionError> {
        let id = self.id_generator.new_id(ctx).await?;
        let session = Session::new(id, user_id.to_string(), self.ttl)?;
        let payload = serde_json::to_string(&session)?;

        ctx.run(
            self.kv
                .set_with_ttl(&Self::session_key(&session.id), payload, self.ttl_millis()),
        )
        .await??;

        debug!(session_id = %session.id, expires_at = %session.expires_at, "Session stored in backend");
        Ok(session)
    }

    #[instrument(skip(self, ctx))]
    async fn get(&self, ctx: &RequestContext, session_id: &str) -> Result<Session, SessionError> {
        let raw = ctx
            .run(self.kv.get(&Self::session_key(session_id)))
            .await??
            .ok_or_else(|| {
                debug!(session_id = %session_id, "Session not found in backend");
                SessionError::NotFound
            })?;

        let session: Session = serde_json::from_str(&raw)?;
        if session.is_expired() {
            debug!(session_id = %session_id, "Stale session record in backend");
            return Err(SessionError::NotFound);
        }

        Ok(session)
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, session_id: &str) -> Result<(), SessionError> {
        let removed = ctx.run(self.kv.del(&Self::session_key(session_id))).await??;
        if !removed {
            warn!(session_id = %session_id, "Session not found for deletion in backend");
            return Err(SessionError::NotFound);
        }

        debug!(session_id = %session_id, "Session deleted from backend");
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
