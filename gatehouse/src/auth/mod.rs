//! Authentication module providing password hashing, user registration and
//! credential verification.
//!
//! - Argon2id password hashing with server-side pepper
//! - Case-insensitive usernames, uniqueness enforced by the credential store
//! - Uniform timing for unknown usernames and wrong passwords
//!
//! ## Example
//!
//! ```no_run
//! use gatehouse::auth::{AuthService, Credentials, PasswordHasher};
//! use gatehouse::db::{Database, DatabaseConfig, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     let users = Arc::new(PgUserRepository::new(db.pool().clone()));
//!     let auth = AuthService::new(users, PasswordHasher::new("secret_pepper"));
//!
//!     let identity = auth.register(&Credentials::new("Alice", "secret1")).await?;
//!     println!("Registered user: {}", identity.username);
//!
//!     let identity = auth.authenticate(&Credentials::new("alice", "secret1")).await?;
//!     println!("Logged in as {}", identity.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod hasher;
pub mod models;
pub mod service;

pub use errors::{AuthError, AuthResult};
pub use hasher::PasswordHasher;
pub use models::{Credentials, Identity, User, UserId};
pub use service::AuthService;
