use serde::{Deserialize, Serialize};

use super::models::Session;

/// Identity attached to a request once its session cookie has been resolved.
/// Handlers behind the session middleware extract it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: String,
}

impl From<&Session> for AuthenticatedUser {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
        }
    }
}
