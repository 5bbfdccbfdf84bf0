//! Credential store abstraction and its PostgreSQL implementation.
//!
//! Expected table shape:
//!
//! ```sql
//! CREATE TABLE users (
//!    id BIGINT PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
//!    username VARCHAR ( 255 ) NOT NULL,
//!    password VARCHAR ( 255 ) NOT NULL
//! );
//! CREATE UNIQUE INDEX username_lower_idx ON users (LOWER(username));
//! ```
//!
//! The unique index on `LOWER(username)` is what makes registration race-free;
//! the repository never checks for an existing user before inserting.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::with_default_timeout;
use crate::auth::{AuthError, AuthResult, User, UserId};

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Trait for credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with an already-hashed password.
    ///
    /// Fails with `AuthError::UsernameTaken` when a user whose username is
    /// case-insensitively equal already exists. The check and the insert are a
    /// single atomic step.
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User>;

    /// Find user by username, ignoring case
    ///
    /// Case folding belongs to the backend. PostgreSQL compares with `LOWER()`
    /// under the database collation, the in-memory store with
    /// [`str::to_lowercase`]. Both agree on ASCII; outside it (Turkish dotted
    /// `İ`, for one) they can disagree.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        let result = with_default_timeout(
            sqlx::query(
                "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id, username, password",
            )
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(super::timeouts::TimeoutError::Database(e)) if is_unique_violation(&e) => {
                Err(AuthError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, username, password FROM users WHERE LOWER(username) = LOWER($1)",
            )
            .bind(username)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, username, password FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password"),
    }
}

/// Whether a database error is a unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.as_ref() == UNIQUE_VIOLATION),
        _ => false,
    }
}
