use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use accounts::{
    generators::{IdGenerator, UuidIdGenerator},
    session::{SessionKv, SessionStore},
    ContextError, InMemorySessionStore, RedisSessionStore, RequestContext, SessionError,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rstest::rstest;

/// Key/value fake that honours TTLs against the wall clock, like the real server
#[derive(Default)]
struct ExpiringKv {
    entries: Mutex<HashMap<String, (String, chrono::DateTime<Utc>)>>,
}

#[async_trait]
impl SessionKv for ExpiringKv {
    async fn set_with_ttl(&self, key: &str, value: String, ttl_ms: u64) -> Result<(), SessionError> {
        let expires = Utc::now() + Duration::milliseconds(ttl_ms as i64);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, expires)) if Utc::now() > *expires => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }
}

fn id_generator() -> Arc<dyn IdGenerator> {
    Arc::new(UuidIdGenerator::new())
}

fn memory_store(ttl: Duration) -> Arc<dyn SessionStore> {
    Arc::new(InMemorySessionStore::new(ttl, id_generator()).unwrap())
}

fn redis_store(ttl: Duration) -> Arc<dyn SessionStore> {
    Arc::new(RedisSessionStore::new(Arc::new(ExpiringKv::default()), ttl, id_generator()).unwrap())
}

#[tokio::test]
async fn test_memory_session_expires_then_disappears() {
    let store = memory_store(Duration::milliseconds(20));
    let ctx = RequestContext::background();

    let session = store.create(&ctx, "u1").await.unwrap();
    assert_eq!(session.user_id, "u1");

    tokio::time::sleep(std::time::Duration::from_millis(40)).await;

    assert!(matches!(store.get(&ctx, &session.id).await, Err(SessionError::Expired)));
    assert!(matches!(store.get(&ctx, &session.id).await, Err(SessionError::NotFound)));
}

#[tokio::test]
async fn test_redis_session_expiry_reads_as_not_found() {
    let store = redis_store(Duration::milliseconds(20));
    let ctx = RequestContext::background();

    let session = store.create(&ctx, "u1").await.unwrap();
    assert_eq!(store.get(&ctx, &session.id).await.unwrap(), session);

    tokio::time::sleep(std::time::Duration::from_millis(40)).await;

    assert!(matches!(store.get(&ctx, &session.id).await, Err(SessionError::NotFound)));
}

#[rstest]
#[case::memory(memory_store(Duration::minutes(5)))]
#[case::redis(redis_store(Duration::minutes(5)))]
#[tokio::test]
async fn test_session_lifecycle(#[case] store: Arc<dyn SessionStore>) {
    let ctx = RequestContext::background();

    let first = store.create(&ctx, "u1").await.unwrap();
    let second = store.create(&ctx, "u1").await.unwrap();
    assert_ne!(first.id, second.id);
    assert!(first.expires_at > Utc::now());
    assert!(first.expires_at <= Utc::now() + store.ttl());

    assert_eq!(store.get(&ctx, &first.id).await.unwrap(), first);

    store.delete(&ctx, &first.id).await.unwrap();
    assert!(matches!(store.get(&ctx, &first.id).await, Err(SessionError::NotFound)));
    assert!(matches!(store.delete(&ctx, &first.id).await, Err(SessionError::NotFound)));

    // Deleting one session leaves the other intact
    assert_eq!(store.get(&ctx, &second.id).await.unwrap(), second);
}

#[rstest]
#[case(Duration::zero())]
#[case(Duration::seconds(-1))]
#[case(Duration::seconds(10_000_000_000_000))]
fn test_unusable_ttl_fails_construction(#[case] ttl: Duration) {
    assert!(matches!(
        InMemorySessionStore::new(ttl, id_generator()),
        Err(SessionError::InvalidTtl)
    ));
    assert!(matches!(
        RedisSessionStore::new(Arc::new(ExpiringKv::default()), ttl, id_generator()),
        Err(SessionError::InvalidTtl)
    ));
}

#[rstest]
#[case::memory(memory_store(Duration::minutes(5)))]
#[case::redis(redis_store(Duration::minutes(5)))]
#[tokio::test]
async fn test_cancelled_context_is_respected(#[case] store: Arc<dyn SessionStore>) {
    let ctx = RequestContext::background();
    let session = store.create(&ctx, "u1").await.unwrap();

    let cancelled = RequestContext::background();
    cancelled.cancel();

    assert!(matches!(
        store.get(&cancelled, &session.id).await,
        Err(SessionError::Context(ContextError::Cancelled))
    ));
    assert!(matches!(
        store.delete(&cancelled, &session.id).await,
        Err(SessionError::Context(ContextError::Cancelled))
    ));
    assert!(store.get(&ctx, &session.id).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_readers_and_writers() {
    let store = memory_store(Duration::minutes(5));
    let ctx = RequestContext::background();
    let shared = store.create(&ctx, "shared").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        let shared_id = shared.id.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::background();
            let own = store.create(&ctx, &format!("user-{i}")).await.unwrap();
            for _ in 0..10 {
                assert_eq!(store.get(&ctx, &shared_id).await.unwrap().user_id, "shared");
            }
            store.delete(&ctx, &own.id).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(store.get(&ctx, &shared.id).await.is_ok());
}
