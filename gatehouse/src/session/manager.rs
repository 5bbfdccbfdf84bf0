//! Session lifecycle: issue, resolve, renew, rotate, destroy.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;

use super::{
    config::SessionConfig,
    errors::{SessionError, SessionResult},
    lock::TokenLocks,
    models::{Session, SessionData, SessionRecord},
    store::SessionStore,
    token,
};
use crate::auth::Identity;

/// Session manager
///
/// Every operation that reads and then writes a session runs inside that
/// session's critical section (see [`TokenLocks`]), so concurrent requests
/// presenting the same token cannot lose each other's updates.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    locks: Arc<TokenLocks>,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `store` - Durable session store
    /// * `config` - TTL and rolling-expiry policy
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            locks: Arc::new(TokenLocks::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve the session for a client-presented token.
    ///
    /// An absent, malformed, unknown or expired token yields a fresh anonymous
    /// session that is not stored until something is written to it. Expired
    /// rows found along the way are deleted. With rolling expiry, a live
    /// session's expiry is pushed to `now + ttl`.
    ///
    /// # Errors
    ///
    /// Only storage failures; a missing session is never an error.
    pub async fn resolve(&self, token: Option<&str>) -> SessionResult<Session> {
        let Some(token) = token.filter(|t| token::is_well_formed(t)) else {
            return Ok(self.fresh());
        };

        let sid = token::session_id(token);
        let _guard = self.locks.acquire(&sid).await;
        let now = Utc::now();

        let Some(record) = self.load_readable(&sid).await? else {
            log::debug!("Unknown session token presented");
            return Ok(self.fresh());
        };

        if record.is_expired(now) {
            log::debug!("Reaping expired session");
            self.store.delete(&sid).await?;
            return Ok(self.fresh());
        }

        let expires_at = if self.config.rolling {
            let renewed = self.config.expires_from(now);
            self.store.touch(&sid, renewed).await?;
            renewed
        } else {
            record.expires_at
        };

        Ok(Session {
            token: token.to_string(),
            data: record.data,
            expires_at,
            rolling: self.config.rolling,
            is_new: false,
        })
    }

    /// Bind an identity to the session and rotate its token.
    ///
    /// The old token stops resolving in the same store operation that makes
    /// the new one valid. Anything else the session held is dropped.
    pub async fn attach_identity(
        &self,
        session: &Session,
        identity: &Identity,
    ) -> SessionResult<Session> {
        let old_sid = token::session_id(&session.token);
        let _guard = self.locks.acquire(&old_sid).await;

        let new_token = token::generate();
        let record = SessionRecord {
            sid: token::session_id(&new_token),
            data: SessionData::for_user(identity.id),
            expires_at: self.config.expires_from(Utc::now()),
        };

        self.store.rotate(&old_sid, &record).await?;
        log::info!("Session established for user {}", identity.id);

        Ok(Session {
            token: new_token,
            data: record.data,
            expires_at: record.expires_at,
            rolling: self.config.rolling,
            is_new: false,
        })
    }

    /// Delete all persisted state for the session
    pub async fn destroy(&self, session: &Session) -> SessionResult<()> {
        let sid = token::session_id(&session.token);
        let _guard = self.locks.acquire(&sid).await;

        self.store.delete(&sid).await?;
        if let Some(user_id) = session.user_id() {
            log::info!("Session destroyed for user {}", user_id);
        }
        Ok(())
    }

    /// Apply `f` to the session payload inside the session's critical section.
    ///
    /// The payload is re-read from the store first, so `f` always sees the
    /// latest committed state rather than the request's snapshot. The write
    /// is skipped when `f` leaves the payload unchanged.
    ///
    /// A new session is stored on its first change. A previously stored
    /// session that has since been destroyed or has expired is not revived;
    /// the change lands in a fresh session under a new token instead.
    ///
    /// Returns the session as it stands afterwards, together with `f`'s
    /// result.
    pub async fn update<F, R>(&self, session: &Session, f: F) -> SessionResult<(Session, R)>
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let sid = token::session_id(&session.token);
        let _guard = self.locks.acquire(&sid).await;
        let now = Utc::now();

        let current = self
            .load_readable(&sid)
            .await?
            .filter(|record| !record.is_expired(now));

        let (base, expires_at, stored) = match current {
            Some(record) => (record.data, record.expires_at, true),
            None if session.is_new => (SessionData::default(), session.expires_at, false),
            None => (SessionData::default(), self.config.expires_from(now), false),
        };

        let mut data = base.clone();
        let output = f(&mut data);

        let revived = !stored && !session.is_new;
        let token = if revived {
            token::generate()
        } else {
            session.token.clone()
        };

        if data == base {
            return Ok((
                Session {
                    token,
                    data,
                    expires_at,
                    rolling: self.config.rolling,
                    is_new: !stored,
                },
                output,
            ));
        }

        let record = SessionRecord {
            sid: token::session_id(&token),
            data,
            expires_at,
        };
        self.store.save(&record).await?;

        Ok((
            Session {
                token,
                data: record.data,
                expires_at: record.expires_at,
                rolling: self.config.rolling,
                is_new: false,
            },
            output,
        ))
    }

    /// Delete every expired session; returns the number removed
    pub async fn sweep_expired(&self) -> SessionResult<u64> {
        let removed = self.store.delete_expired(Utc::now()).await?;
        if removed > 0 {
            log::info!("Swept {} expired session(s)", removed);
        }
        Ok(removed)
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `interval` until the
    /// returned task is aborted.
    ///
    /// Lazy reaping in `resolve` is enough for correctness; the sweep only
    /// keeps the store from accumulating abandoned sessions.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup stays quiet.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = manager.sweep_expired().await {
                    log::error!("Expired session sweep failed: {}", e);
                }
            }
        })
    }

    /// Load a session, discarding a stored payload that no longer decodes.
    ///
    /// The unreadable row is deleted and treated as absent, so the client
    /// gets a fresh session instead of an error on every request.
    async fn load_readable(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        match self.store.load(sid).await {
            Ok(record) => Ok(record),
            Err(SessionError::Serialization(e)) => {
                log::warn!("Discarding undecodable session payload: {}", e);
                self.store.delete(sid).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn fresh(&self) -> Session {
        Session {
            token: token::generate(),
            data: SessionData::default(),
            expires_at: self.config.expires_from(Utc::now()),
            rolling: self.config.rolling,
            is_new: true,
        }
    }
}
