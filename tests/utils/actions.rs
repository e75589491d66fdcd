use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

/// Status, cookie header and decoded JSON body of one response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// `session_id=<value>` pair from `Set-Cookie`, ready to send back as a `Cookie` header
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie
            .as_deref()
            .and_then(|cookie| cookie.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| pair.starts_with("session_id=") && pair.len() > "session_id=".len())
    }
}

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a request through the router and collect the response
    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Send a raw (possibly malformed) JSON body
    pub async fn send_raw(&self, method: Method, uri: &str, cookie: Option<&str>, raw: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::from(raw.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            set_cookie: None,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn register(&self, user_name: &str, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/users/register",
            None,
            Some(json!({"user_name": user_name, "email": email, "password": password})),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"email": email, "password": password})),
        )
        .await
    }

    /// Log in and return the cookie to send with later requests
    pub async fn login_cookie(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response.session_cookie().expect("login should set a session cookie")
    }

    pub async fn logout(&self, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, "/users/logout", cookie, None).await
    }

    pub async fn get_me(&self, cookie: &str) -> TestResponse {
        self.send(Method::GET, "/users/me", Some(cookie), None).await
    }

    pub async fn update_me(&self, cookie: &str, changes: Value) -> TestResponse {
        self.send(Method::PATCH, "/users/me", Some(cookie), Some(changes)).await
    }

    pub async fn delete_me(&self, cookie: &str) -> TestResponse {
        self.send(Method::DELETE, "/users/me", Some(cookie), None).await
    }
}
