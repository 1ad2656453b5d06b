/// Opaque bearer token generation and at-rest hashing
///
/// Login exchanges a valid username/password for an opaque 40-character key.
/// Only the SHA-256 hash of the key is persisted; the plaintext is returned
/// to the client once and never stored. Requests present the key as
/// `Authorization: Token <key>` and are matched against the stored hash.
///
/// Because the plaintext cannot be recovered from the store, logging in again
/// rotates the token: the previous row is deleted and a fresh key is minted.
///
/// # Example
///
/// ```
/// use bazaar_shared::auth::token::{generate_key, hash_key};
///
/// let key = generate_key();
/// assert_eq!(key.len(), 40);
///
/// let hash = hash_key(&key);
/// assert_eq!(hash.len(), 64); // SHA-256 hex
/// ```

use sha2::{Digest, Sha256};

/// Length of a generated token key
pub const TOKEN_KEY_LENGTH: usize = 40;

/// Generates a secure random token key
///
/// 40 characters drawn from `[a-zA-Z0-9]` using the thread-local CSPRNG.
pub fn generate_key() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..TOKEN_KEY_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a token key with SHA-256
///
/// Returns the lowercase hex digest, which is what the `auth_tokens` table
/// stores and what lookups match against.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_length_and_charset() {
        let key = generate_key();
        assert_eq!(key.len(), TOKEN_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_key_unique() {
        let a = generate_key();
        let b = generate_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_key_hex_digest() {
        let hash = hash_key("some-token-key");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_key_deterministic() {
        assert_eq!(hash_key("abc"), hash_key("abc"));
        assert_ne!(hash_key("abc"), hash_key("abd"));
    }
}
