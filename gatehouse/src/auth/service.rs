//! Authentication service: credential verification and registration.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{
    errors::{AuthError, AuthResult},
    hasher::PasswordHasher,
    models::{Credentials, Identity},
};
use crate::db::UserRepository;
use crate::session::Session;

/// Longest accepted username, matching the `VARCHAR(255)` column
pub const MAX_USERNAME_LEN: usize = 255;

/// Upper bound on password length, keeps a single hash computation bounded
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Verified against when the username does not exist, so a miss costs the
/// same as a wrong password.
const DUMMY_PASSWORD: &str = "gatehouse-timing-equalizer";

/// Authentication service
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `hasher` - Password hasher (carries the server-side pepper)
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self {
            users,
            hasher: Arc::new(hasher),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Verify a username/password pair.
    ///
    /// The username lookup is case-insensitive. The password check runs on
    /// every path, including the unknown-user path, to keep response timing
    /// independent of whether the account exists.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - no user with that username
    /// * `AuthError::PasswordMismatch` - password does not match
    /// * `AuthError::Database` / `AuthError::Timeout` - store unavailable
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Identity> {
        let username = credentials.username.trim();
        let user = self.users.find_by_username(username).await?;

        let Some(user) = user else {
            let dummy = self.dummy_hash().await?;
            self.verify_blocking(credentials.password.clone(), dummy)
                .await?;
            log::debug!("Login rejected: unknown username");
            return Err(AuthError::UserNotFound);
        };

        let matches = self
            .verify_blocking(credentials.password.clone(), user.password_hash.clone())
            .await?;

        if matches {
            log::info!("User {} authenticated", user.id);
            Ok(Identity::from(&user))
        } else {
            log::debug!("Login rejected for user {}: password mismatch", user.id);
            Err(AuthError::PasswordMismatch)
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - a case-insensitive duplicate exists
    /// * `AuthError::InvalidUsername` - username format invalid
    /// * `AuthError::WeakPassword` - password rejected by validation
    pub async fn register(&self, credentials: &Credentials) -> AuthResult<Identity> {
        let username = credentials.username.trim();
        validate_username(username)?;
        validate_password(&credentials.password)?;

        let password_hash = self.hash_blocking(credentials.password.clone()).await?;

        // Uniqueness is enforced by the store itself; no pre-check here.
        let user = self.users.create_user(username, &password_hash).await?;

        log::info!("Registered user {} ({})", user.id, user.username);
        Ok(Identity::from(&user))
    }

    /// Resolve the identity attached to a session.
    ///
    /// Returns `None` for anonymous sessions and for sessions whose user no
    /// longer exists.
    pub async fn current_identity(&self, session: &Session) -> AuthResult<Option<Identity>> {
        let Some(user_id) = session.user_id() else {
            return Ok(None);
        };

        let user = self.users.find_by_id(user_id).await?;
        if user.is_none() {
            log::warn!("Session references missing user {}", user_id);
        }
        Ok(user.as_ref().map(Identity::from))
    }

    async fn dummy_hash(&self) -> AuthResult<String> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_blocking(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    async fn hash_blocking(&self, password: String) -> AuthResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::HashingFailed)?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> AuthResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|_| AuthError::HashingFailed)
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    if username.chars().any(char::is_control) {
        return Err(AuthError::InvalidUsername(
            "Username cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword(
            "Password must not be empty".to_string(),
        ));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hasher::fast_hasher;
    use crate::db::{MemoryUserRepository, UserRepository};
    use crate::session::{Session, SessionData};

    fn service() -> (AuthService, Arc<MemoryUserRepository>) {
        let users = Arc::new(MemoryUserRepository::new());
        (AuthService::new(users.clone(), fast_hasher()), users)
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (auth, _) = service();

        let registered = auth
            .register(&Credentials::new("Alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(registered.username, "Alice");

        let identity = auth
            .authenticate(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(identity, registered);
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let (auth, _) = service();
        auth.register(&Credentials::new("Alice", "secret1"))
            .await
            .unwrap();

        let err = auth
            .authenticate(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        let err = auth
            .authenticate(&Credentials::new("bob", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (auth, users) = service();
        auth.register(&Credentials::new("dave", "plaintext-pw"))
            .await
            .unwrap();

        let user = users.find_by_username("dave").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "plaintext-pw");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_trims_username() {
        let (auth, _) = service();
        let identity = auth
            .register(&Credentials::new("  erin ", "pw"))
            .await
            .unwrap();
        assert_eq!(identity.username, "erin");

        auth.authenticate(&Credentials::new("ERIN", "pw"))
            .await
            .expect("trimmed, case-insensitive login should succeed");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (auth, _) = service();

        let err = auth
            .register(&Credentials::new("   ", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername(_)));

        let err = auth
            .register(&Credentials::new("x".repeat(MAX_USERNAME_LEN + 1), "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername(_)));

        let err = auth
            .register(&Credentials::new("tab\tuser", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername(_)));

        let err = auth
            .register(&Credentials::new("frank", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        let err = auth
            .register(&Credentials::new("frank", "p".repeat(MAX_PASSWORD_BYTES + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_current_identity() {
        let (auth, _) = service();
        let identity = auth
            .register(&Credentials::new("grace", "pw"))
            .await
            .unwrap();

        let mut session = Session::anonymous_for_test();
        assert_eq!(auth.current_identity(&session).await.unwrap(), None);

        session.data = SessionData::for_user(identity.id);
        assert_eq!(
            auth.current_identity(&session).await.unwrap(),
            Some(identity)
        );

        session.data = SessionData::for_user(9999);
        assert_eq!(auth.current_identity(&session).await.unwrap(), None);
    }
}
