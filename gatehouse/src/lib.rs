//! # Gatehouse
//!
//! Password authentication and server-side sessions for web applications.
//!
//! A login request flows through the crate like this:
//!
//! 1. [`auth::AuthService::authenticate`] looks the user up case-insensitively
//!    through a [`db::UserRepository`] and checks the password with the
//!    Argon2id [`auth::PasswordHasher`].
//! 2. On success, [`session::SessionManager::attach_identity`] binds the
//!    identity to the caller's session and rotates its token.
//! 3. On failure, [`session::FlashChannel::push_error`] queues the reason for
//!    the next request, which reads it once with
//!    [`session::FlashChannel::pop_all`].
//!
//! Every request starts with [`session::SessionManager::resolve`], which never
//! fails on a missing or expired token: the caller simply gets a fresh
//! anonymous session.
//!
//! ## Core Modules
//!
//! - [`auth`]: hashing, registration, credential verification
//! - [`db`]: connection pool and the credential store
//! - [`session`]: session lifecycle, storage and flash messages

/// Password hashing, registration and credential verification.
pub mod auth;
pub use auth::{AuthError, AuthResult, AuthService, Credentials, Identity, PasswordHasher};

/// Connection pooling and the credential store.
pub mod db;

/// Session lifecycle, persistence and the flash channel.
pub mod session;
pub use session::{FlashChannel, FlashMessage, Session, SessionConfig, SessionError, SessionManager};
