//! Server-side sessions and the flash message channel.
//!
//! - Opaque 256-bit tokens, stored only as SHA-256 digests
//! - Rolling or fixed expiry, lazy reaping plus an optional periodic sweep
//! - Token rotation whenever an identity is attached
//! - Per-session critical sections for every read-modify-write
//!
//! ## Example
//!
//! ```no_run
//! use gatehouse::auth::Identity;
//! use gatehouse::session::{FlashChannel, MemorySessionStore, SessionConfig, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), gatehouse::session::SessionError> {
//! let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()), SessionConfig::default());
//! let flash = FlashChannel::new(sessions.clone());
//!
//! // First request: no cookie yet
//! let session = sessions.resolve(None).await?;
//! let session = flash.push_error(&session, "incorrect password").await?;
//!
//! // Next request presents the token and reads the message once
//! let session = sessions.resolve(Some(&session.token)).await?;
//! let messages = flash.pop_all(&session).await?;
//! assert_eq!(messages.len(), 1);
//!
//! // Successful login: rotate the token
//! let identity = Identity { id: 1, username: "Alice".to_string() };
//! let session = sessions.attach_identity(&session, &identity).await?;
//! # let _ = session;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod flash;
pub mod lock;
pub mod manager;
pub mod memory;
pub mod models;
pub mod store;
pub mod token;

pub use config::{DEFAULT_SESSION_TTL, DEFAULT_SWEEP_INTERVAL, SessionConfig};
pub use errors::{SessionError, SessionResult};
pub use flash::FlashChannel;
pub use manager::SessionManager;
pub use memory::MemorySessionStore;
pub use models::{FlashKind, FlashMessage, Session, SessionData, SessionRecord};
pub use store::{PgSessionStore, SessionStore};
