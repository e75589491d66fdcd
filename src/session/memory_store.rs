use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    errors::SessionError,
    models::Session,
    store::{validate_ttl, SessionStore},
};
use crate::context::RequestContext;
use crate::generators::IdGenerator;

/// Process-local session store.
///
/// Sessions live in a map guarded by a reader/writer lock. Expired sessions
/// are evicted lazily when read, and in bulk by [`InMemorySessionStore::purge_expired`]
/// when a sweeper is running. Everything is lost when the process exits.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    id_generator: Arc<dyn IdGenerator>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration, id_generator: Arc<dyn IdGenerator>) -> Result<Self, SessionError> {
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: validate_ttl(ttl)?,
            id_generator,
        })
    }

    /// Number of stored sessions, expired ones included until evicted
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session whose expiry has passed, returning how many were removed
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();

        sessions.retain(|_, session| !session.is_expired_at(now));

        let removed = before - sessions.len();
        debug!(expired_sessions_removed = removed, "Expired sessions purged from memory");
        removed
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    #[instrument(skip(self, ctx))]
    async fn create(&self, ctx: &RequestContext, user_id: &str) -> Result<Session, SessionError> {
        let id = self.id_generator.new_id(ctx).await?;
        let session = Session::new(id, user_id.to_string(), self.ttl)?;

        let mut sessions = ctx.run(self.sessions.write()).await?;
        sessions.insert(session.id.clone(), session.clone());

        debug!(session_id = %session.id, expires_at = %session.expires_at, "Session created in memory");
        Ok(session)
    }

    #[instrument(skip(self, ctx))]
    async fn get(&self, ctx: &RequestContext, session_id: &str) -> Result<Session, SessionError> {
        {
            let sessions = ctx.run(self.sessions.read()).await?;
            match sessions.get(session_id) {
                None => {
                    debug!(session_id = %session_id, "Session not found in memory");
                    return Err(SessionError::NotFound);
                }
                Some(session) if !session.is_expired() => return Ok(session.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another request may have evicted or
        // replaced the entry between dropping the read lock and getting here.
        let mut sessions = ctx.run(self.sessions.write()).await?;
        match sessions.get(session_id) {
            None => Err(SessionError::NotFound),
            Some(session) if !session.is_expired() => Ok(session.clone()),
            Some(_) => {
                sessions.remove(session_id);
                debug!(session_id = %session_id, "Expired session evicted from memory");
                Err(SessionError::Expired)
            }
        }
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = ctx.run(self.sessions.write()).await?;
        if sessions.remove(session_id).is_none() {
            warn!(session_id = %session_id, "Session not found for deletion in memory");
            return Err(SessionError::NotFound);
        }

        debug!(session_id = %session_id, "Session deleted from memory");
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
