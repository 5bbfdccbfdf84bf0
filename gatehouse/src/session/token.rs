//! Session token generation and storage keys.
//!
//! The client holds the raw token; the store only ever sees its SHA-256
//! digest, so a leaked session table cannot be replayed as cookies.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

/// Hex-encoded length of a token
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Generate a new unguessable session token
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether a client-presented value could be a token we issued.
///
/// Anything else is treated as absent without touching the store.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Storage key for a token
pub fn session_id(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
