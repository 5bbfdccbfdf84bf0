//! Durable session storage.
//!
//! Expected table shape (the layout used by common Postgres session stores):
//!
//! ```sql
//! CREATE TABLE "session" (
//!   "sid" varchar NOT NULL COLLATE "default" PRIMARY KEY,
//!   "sess" json NOT NULL,
//!   "expire" timestamp(6) NOT NULL
//! );
//! CREATE INDEX "IDX_session_expire" ON "session" ("expire");
//! ```
//!
//! `sid` holds the SHA-256 digest of the client token, never the token
//! itself. `expire` is UTC without time zone.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Row};

use super::{
    errors::SessionResult,
    models::{SessionData, SessionRecord},
};
use crate::db::timeouts::{
    DEFAULT_TRANSACTION_TIMEOUT, SWEEP_TIMEOUT, with_default_timeout, with_timeout,
};

/// Trait for session persistence
///
/// Every method is a single atomic step at the storage layer. Callers that
/// need read-modify-write atomicity hold the session's lock around the pair
/// of calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by id, expired or not
    async fn load(&self, sid: &str) -> SessionResult<Option<SessionRecord>>;

    /// Insert or replace a session
    async fn save(&self, record: &SessionRecord) -> SessionResult<()>;

    /// Update only the expiry of an existing session
    async fn touch(&self, sid: &str, expires_at: DateTime<Utc>) -> SessionResult<()>;

    /// Delete `old_sid` (if present) and insert `record`, all or nothing
    async fn rotate(&self, old_sid: &str, record: &SessionRecord) -> SessionResult<()>;

    /// Delete a session
    async fn delete(&self, sid: &str) -> SessionResult<()>;

    /// Delete every session that expired at or before `now`; returns the count
    async fn delete_expired(&self, now: DateTime<Utc>) -> SessionResult<u64>;
}

/// PostgreSQL implementation of `SessionStore`
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UPSERT_SESSION: &str = r#"
    INSERT INTO "session" (sid, sess, expire)
    VALUES ($1, $2::json, $3)
    ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expire = EXCLUDED.expire
"#;

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        let row = with_default_timeout(
            sqlx::query(r#"SELECT sid, sess::text AS sess, expire FROM "session" WHERE sid = $1"#)
                .bind(sid)
                .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.get("sess");
        Ok(Some(SessionRecord {
            sid: row.get("sid"),
            data: serde_json::from_str::<SessionData>(&payload)?,
            expires_at: row.get::<NaiveDateTime, _>("expire").and_utc(),
        }))
    }

    async fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        let payload = serde_json::to_string(&record.data)?;
        with_default_timeout(
            sqlx::query(UPSERT_SESSION)
                .bind(&record.sid)
                .bind(payload)
                .bind(record.expires_at.naive_utc())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn touch(&self, sid: &str, expires_at: DateTime<Utc>) -> SessionResult<()> {
        with_default_timeout(
            sqlx::query(r#"UPDATE "session" SET expire = $2 WHERE sid = $1"#)
                .bind(sid)
                .bind(expires_at.naive_utc())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn rotate(&self, old_sid: &str, record: &SessionRecord) -> SessionResult<()> {
        let payload = serde_json::to_string(&record.data)?;
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(r#"DELETE FROM "session" WHERE sid = $1"#)
                .bind(old_sid)
                .execute(&mut *tx)
                .await?;

            sqlx::query(UPSERT_SESSION)
                .bind(&record.sid)
                .bind(&payload)
                .bind(record.expires_at.naive_utc())
                .execute(&mut *tx)
                .await?;

            tx.commit().await
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, sid: &str) -> SessionResult<()> {
        with_default_timeout(
            sqlx::query(r#"DELETE FROM "session" WHERE sid = $1"#)
                .bind(sid)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> SessionResult<u64> {
        let result = with_timeout(
            SWEEP_TIMEOUT,
            sqlx::query(r#"DELETE FROM "session" WHERE expire <= $1"#)
                .bind(now.naive_utc())
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
