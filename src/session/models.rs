use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SessionError;

/// Server-issued, time-bounded credential binding a client to a user id.
///
/// This is also the serialized form kept by the networked store:
/// `{"id": .., "user_id": .., "expires_at": "<RFC 3339>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session expiring `ttl` from now
    pub fn new(id: String, user_id: String, ttl: Duration) -> Result<Self, SessionError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(SessionError::InvalidTtl)?;

        Ok(Self {
            id,
            user_id,
            expires_at,
        })
    }

    /// A session is still valid at exactly `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
