//! In-process credential store.
//!
//! Used by the test suites and for running the server without PostgreSQL.
//! The case-insensitive uniqueness check and the insert happen under one
//! write lock, which gives the same guarantee as the unique index does in
//! the database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::UserRepository;
use crate::auth::{AuthError, AuthResult, User, UserId};

#[derive(Default)]
struct UserTable {
    users: HashMap<UserId, User>,
    /// Lowercased username -> id
    by_username: HashMap<String, UserId>,
    next_id: UserId,
}

/// In-memory implementation of `UserRepository`
#[derive(Default)]
pub struct MemoryUserRepository {
    table: RwLock<UserTable>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.table.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Unicode lowercase, locale independent. May differ from the PostgreSQL
/// collation's `LOWER()` outside ASCII.
fn username_key(username: &str) -> String {
    username.to_lowercase()
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        let mut table = self.table.write().await;
        let key = username_key(username);

        if table.by_username.contains_key(&key) {
            return Err(AuthError::UsernameTaken);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };

        table.by_username.insert(key, user.id);
        table.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table
            .by_username
            .get(&username_key(username))
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.table.read().await.users.get(&user_id).cloned())
    }
}
