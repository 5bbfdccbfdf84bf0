//! Argon2id password hashing with a server-side pepper.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use super::errors::{AuthError, AuthResult};

/// One-way salted password hasher.
///
/// Every call to [`hash`](Self::hash) draws a fresh salt, so hashing the same
/// password twice gives two different PHC strings. Verification reads the salt
/// and cost parameters back out of the stored string and compares in constant
/// time.
///
/// Both operations are CPU bound. Async callers should run them on the
/// blocking pool.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    pepper: String,
}

impl PasswordHasher {
    /// Create a hasher with the default Argon2id cost parameters
    pub fn new(pepper: impl Into<String>) -> Self {
        Self::with_params(pepper, Params::default())
    }

    /// Create a hasher with explicit cost parameters
    ///
    /// Hashes produced with one set of parameters still verify under another,
    /// because the parameters travel inside the hash string.
    pub fn with_params(pepper: impl Into<String>, params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper: pepper.into(),
        }
    }

    /// Hash a password with Argon2id + pepper
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - the underlying hash computation failed
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = self.pepper(password);
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Check a password against a stored hash.
    ///
    /// A mismatch is `false`, never an error. A stored value that is not a
    /// valid PHC string cannot match anything and is also `false`.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };

        let peppered = self.pepper(password);
        self.argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn pepper(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .field("pepper", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    // Minimum Argon2 cost, keeps unit tests quick in debug builds.
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    PasswordHasher::with_params("test_pepper_value", params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert_ne!(first, second, "Each hash should carry its own salt");
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_pepper_is_part_of_the_hash() {
        let params = Params::new(8, 1, 1, None).unwrap();
        let hasher = PasswordHasher::with_params("pepper-one", params.clone());
        let other = PasswordHasher::with_params("pepper-two", params);

        let hash = hasher.hash("secret1").unwrap();
        assert!(!other.verify("secret1", &hash));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("secret1", "not-a-phc-string"));
        assert!(!hasher.verify("secret1", ""));
    }

    #[test]
    fn test_debug_hides_pepper() {
        let rendered = format!("{:?}", fast_hasher());
        assert!(!rendered.contains("test_pepper_value"));
    }
}
