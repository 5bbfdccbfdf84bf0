//! In-process session store for tests and single-node development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{errors::SessionResult, models::SessionRecord, store::SessionStore};

/// In-memory implementation of `SessionStore`
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(sid).cloned())
    }

    async fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        self.sessions
            .write()
            .await
            .insert(record.sid.clone(), record.clone());
        Ok(())
    }

    async fn touch(&self, sid: &str, expires_at: DateTime<Utc>) -> SessionResult<()> {
        if let Some(record) = self.sessions.write().await.get_mut(sid) {
            record.expires_at = expires_at;
        }
        Ok(())
    }

    async fn rotate(&self, old_sid: &str, record: &SessionRecord) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(old_sid);
        sessions.insert(record.sid.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, sid: &str) -> SessionResult<()> {
        self.sessions.write().await.remove(sid);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> SessionResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
