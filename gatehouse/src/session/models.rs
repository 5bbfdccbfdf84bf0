//! Session data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserId;

/// Category of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Error,
    Info,
}

/// Message queued for exactly one later read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            text: text.into(),
        }
    }
}

/// Persisted session payload (the `sess` JSON column)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Authenticated user; `None` for anonymous sessions
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Pending flash messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flash: Vec<FlashMessage>,
}

impl SessionData {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            flash: Vec::new(),
        }
    }
}

/// A session as seen by one request.
///
/// The token is the only handle the client holds. A session with `is_new` set
/// was issued during this request and has not been written to the store yet;
/// it is persisted on its first mutation.
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
    /// Rolling expiry is active for this session
    pub rolling: bool,
    pub is_new: bool,
}

impl Session {
    /// The authenticated user, if any
    pub fn user_id(&self) -> Option<UserId> {
        self.data.user_id
    }

    pub fn is_anonymous(&self) -> bool {
        self.data.user_id.is_none()
    }

    #[cfg(test)]
    pub(crate) fn anonymous_for_test() -> Self {
        Self {
            token: super::token::generate(),
            data: SessionData::default(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            rolling: false,
            is_new: true,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("data", &self.data)
            .field("expires_at", &self.expires_at)
            .field("rolling", &self.rolling)
            .field("is_new", &self.is_new)
            .finish()
    }
}

/// Row in the session store, keyed by the token digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub sid: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
