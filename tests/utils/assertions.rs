//! Test assertion helpers - fluent API for verifying responses
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::StatusCode;
use serde_json::Value;

use super::actions::TestResponse;

// ============================================================================
// Assertion Helpers
// ============================================================================

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {:?}",
            self.body
        );
        self
    }

    /// Asserts the `{"error": message}` body and its status
    pub fn assert_error(&self, expected: StatusCode, message: &str) -> &Self {
        self.assert_status(expected);
        assert_eq!(self.body["error"], message, "unexpected error body");
        self
    }

    /// The `user` object of a `{"user": {...}}` body
    pub fn user(&self) -> &Value {
        let user = &self.body["user"];
        assert!(user.is_object(), "response has no user: {:?}", self.body);
        assert!(
            user.get("hashed_password").is_none(),
            "password hash must never be serialized"
        );
        user
    }

    pub fn assert_cookie_cleared(&self) -> &Self {
        let cookie = self
            .set_cookie
            .as_deref()
            .expect("response should set a cookie");
        assert!(
            cookie.starts_with("session_id=;") || cookie.starts_with("session_id=\"\""),
            "cookie not cleared: {cookie}"
        );
        assert!(cookie.contains("Max-Age=0"), "cookie not expired: {cookie}");
        self
    }
}
