use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

use super::models::Session;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

/// Attributes applied to every session cookie the service sets
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Only send the cookie over HTTPS
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// `session_id=<id>; Path=/; HttpOnly; SameSite=Lax; Expires=<expires_at>`
    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        let builder = Cookie::build((SESSION_COOKIE, session.id.clone()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);

        match OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp()) {
            Ok(expires) => builder.expires(expires).build(),
            Err(_) => builder.build(),
        }
    }

    /// Empty cookie with `Max-Age=0` so the client drops the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

/// Session id from the request cookies, if present and non-empty
pub fn session_id_from(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}
