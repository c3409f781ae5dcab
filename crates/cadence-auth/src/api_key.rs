//! Long-lived API keys.
//!
//! Keys are shown to the caller once; the store only keeps their SHA-256 digest.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use cadence_core::defaults::{API_KEY_PREFIX, API_KEY_RANDOM_LEN};

/// Generate a fresh `ck_`-prefixed API key.
pub fn generate_api_key() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_PREFIX, random)
}

/// Digest stored in place of the key.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Whether a bearer credential has the API key shape.
pub fn looks_like_api_key(credential: &str) -> bool {
    credential.starts_with(API_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let key = generate_api_key();
        assert!(key.starts_with("ck_"));
        assert_eq!(key.len(), 3 + API_KEY_RANDOM_LEN);
        assert!(key[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(looks_like_api_key(&key));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_api_key("ck_example");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("ck_example"));
        assert_ne!(hash, hash_api_key("ck_other"));
    }
}
