//! Integration tests against a live PostgreSQL database.
//!
//! Ignored by default. Run with a database that accepts the schema in
//! `migrations/001_initial_schema.sql`:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p gatehouse --test pg_integration -- --ignored
//! ```

use argon2::Params;
use chrono::{Duration as ChronoDuration, Utc};
use gatehouse::auth::{AuthError, AuthService, Credentials, PasswordHasher};
use gatehouse::db::{Database, DatabaseConfig, PgUserRepository, UserRepository};
use gatehouse::session::{
    FlashChannel, PgSessionStore, SessionConfig, SessionData, SessionManager, SessionRecord,
    SessionStore,
};
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

const SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Generate a unique username so reruns do not collide
fn unique_username(prefix: &str) -> String {
    let rand_id: u32 = rand::random();
    format!("{}_{}", prefix, rand_id % 1_000_000)
}

/// Helper to create a test database pool with the schema applied
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/gatehouse_test".to_string());

    let config = DatabaseConfig {
        database_url,
        max_connections: 5,
        min_connections: 1,
        connection_timeout_secs: 5,
        idle_timeout_secs: 300,
        max_lifetime_secs: 1800,
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");

    sqlx::raw_sql(SCHEMA)
        .execute(db.pool())
        .await
        .expect("Failed to apply schema");

    db.pool().clone()
}

fn fast_hasher() -> PasswordHasher {
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    PasswordHasher::with_params("pg_test_pepper", params)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial]
async fn test_pg_register_and_authenticate() {
    let pool = setup_test_db().await;
    let auth = AuthService::new(Arc::new(PgUserRepository::new(pool)), fast_hasher());
    let username = unique_username("Alice");

    let registered = auth
        .register(&Credentials::new(&username, "secret1"))
        .await
        .expect("Registration should succeed");

    let identity = auth
        .authenticate(&Credentials::new(username.to_lowercase(), "secret1"))
        .await
        .expect("Case-insensitive login should succeed");
    assert_eq!(identity, registered);

    let result = auth
        .authenticate(&Credentials::new(&username, "wrong"))
        .await;
    assert!(matches!(result, Err(AuthError::PasswordMismatch)));

    let result = auth
        .register(&Credentials::new(username.to_uppercase(), "other"))
        .await;
    assert!(matches!(result, Err(AuthError::UsernameTaken)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial]
async fn test_pg_concurrent_registration() {
    let pool = setup_test_db().await;
    let repo = Arc::new(PgUserRepository::new(pool));
    let username = unique_username("carol");
    let shouted = username.to_uppercase();

    let (first, second) = tokio::join!(
        repo.create_user(&username, "hash-one"),
        repo.create_user(&shouted, "hash-two"),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "The unique index admits exactly one");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial]
async fn test_pg_session_store_round_trip() {
    let pool = setup_test_db().await;
    let store = PgSessionStore::new(pool);
    let sid = unique_username("sid");

    let record = SessionRecord {
        sid: sid.clone(),
        data: SessionData::for_user(42),
        expires_at: Utc::now() + ChronoDuration::hours(1),
    };
    store.save(&record).await.unwrap();

    let loaded = store.load(&sid).await.unwrap().expect("record exists");
    assert_eq!(loaded.data, record.data);
    // timestamp(6) keeps microseconds only
    assert!((loaded.expires_at - record.expires_at).num_milliseconds().abs() < 1);

    let new_expiry = Utc::now() + ChronoDuration::hours(2);
    store.touch(&sid, new_expiry).await.unwrap();
    let touched = store.load(&sid).await.unwrap().unwrap();
    assert!(touched.expires_at > loaded.expires_at);
    assert_eq!(touched.data, record.data);

    let rotated = SessionRecord {
        sid: unique_username("sid"),
        ..record.clone()
    };
    store.rotate(&sid, &rotated).await.unwrap();
    assert!(store.load(&sid).await.unwrap().is_none());
    assert!(store.load(&rotated.sid).await.unwrap().is_some());

    store.delete(&rotated.sid).await.unwrap();
    assert!(store.load(&rotated.sid).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial]
async fn test_pg_sweep_removes_expired() {
    let pool = setup_test_db().await;
    let store = PgSessionStore::new(pool);

    let expired = SessionRecord {
        sid: unique_username("expired"),
        data: SessionData::default(),
        expires_at: Utc::now() - ChronoDuration::minutes(5),
    };
    store.save(&expired).await.unwrap();

    let removed = store.delete_expired(Utc::now()).await.unwrap();
    assert!(removed >= 1);
    assert!(store.load(&expired.sid).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial]
async fn test_pg_login_flow_with_flash() {
    let pool = setup_test_db().await;
    let auth = AuthService::new(Arc::new(PgUserRepository::new(pool.clone())), fast_hasher());
    let sessions = SessionManager::new(Arc::new(PgSessionStore::new(pool)), SessionConfig::default());
    let flash = FlashChannel::new(sessions.clone());
    let username = unique_username("dave");

    auth.register(&Credentials::new(&username, "pw"))
        .await
        .unwrap();

    let session = sessions.resolve(None).await.unwrap();
    let err = auth
        .authenticate(&Credentials::new(&username, "bad"))
        .await
        .unwrap_err();
    let session = flash.push_error(&session, err.client_message()).await.unwrap();

    let session = sessions.resolve(Some(&session.token)).await.unwrap();
    assert_eq!(flash.pop_all(&session).await.unwrap().len(), 1);

    let identity = auth
        .authenticate(&Credentials::new(&username, "pw"))
        .await
        .unwrap();
    let logged_in = sessions.attach_identity(&session, &identity).await.unwrap();

    let resolved = sessions.resolve(Some(&logged_in.token)).await.unwrap();
    assert_eq!(auth.current_identity(&resolved).await.unwrap(), Some(identity));

    sessions.destroy(&resolved).await.unwrap();
    let after = sessions.resolve(Some(&logged_in.token)).await.unwrap();
    assert!(after.is_anonymous());
}
