//! Session expiry configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between expired-session sweeps (15 minutes)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Session lifetime policy
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a session, counted from creation or, when rolling, from
    /// the last request that touched it
    pub ttl: Duration,

    /// Push the expiry forward on every access
    pub rolling: bool,
}

impl SessionConfig {
    /// TTL as a `chrono` duration for timestamp arithmetic
    pub fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// Expiry for a session touched at `now`, saturating at the latest
    /// representable instant
    pub fn expires_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl_chrono())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            rolling: true,
        }
    }
}
