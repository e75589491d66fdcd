use std::sync::Arc;

use accounts::{
    build_router,
    generators::{IdGenerator, UuidIdGenerator},
    AppState, InMemorySessionStore, InMemoryUserRepository, RequestContext, User,
};
use axum::Router;

use super::fakes::FastHasher;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub state: AppState,
    pub repository: Arc<InMemoryUserRepository>,
    pub session_store: Arc<InMemorySessionStore>,
    pub users: Vec<User>,
}

pub struct TestSetupBuilder {
    session_ttl: chrono::Duration,
    users: Vec<(String, String, String)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            session_ttl: chrono::Duration::hours(1),
            users: vec![],
        }
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Registers `(username, email, password)` before the test starts
    pub fn with_user(mut self, username: &str, email: &str, password: &str) -> Self {
        self.users
            .push((username.to_string(), email.to_string(), password.to_string()));
        self
    }

    pub fn with_alice(self) -> Self {
        self.with_user("alice", "alice@example.com", "password123")
    }

    pub fn with_alice_and_bob(self) -> Self {
        self.with_alice()
            .with_user("bob", "bob@example.com", "hunter2hunter2")
    }

    pub async fn build(self) -> TestSetup {
        let id_generator: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator::new());
        let repository = Arc::new(InMemoryUserRepository::new());
        let session_store =
            Arc::new(InMemorySessionStore::new(self.session_ttl, id_generator.clone()).unwrap());

        let state = AppState::new(
            repository.clone(),
            session_store.clone(),
            Arc::new(FastHasher),
            id_generator,
        );

        let ctx = RequestContext::background();
        let mut users = Vec::new();
        for (username, email, password) in &self.users {
            let user = state
                .register_service
                .register(&ctx, username, email, password)
                .await
                .unwrap();
            users.push(user);
        }

        TestSetup {
            app: build_router(state.clone()),
            state,
            repository,
            session_store,
            users,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
