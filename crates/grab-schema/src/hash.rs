//! Cache keys derived from a request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Query;

/// Newtype for the SHA256 digest of a [`Query`] (64 hex characters).
///
/// Used as the result cache key. The digest covers every field of the query,
/// including the token, so results fetched with one credential are never
/// served to a request carrying another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHash(String);

impl QueryHash {
    /// Hash a query.
    ///
    /// The serialized form skips the token, so it is fed to the hasher
    /// separately after a NUL separator.
    pub fn of(query: &Query) -> Self {
        let mut hasher = Sha256::new();
        // Serializing plain strings and bools into JSON cannot fail.
        let canonical = serde_json::to_vec(query).unwrap_or_default();
        hasher.update(&canonical);
        hasher.update([0u8]);
        hasher.update(query.token.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for QueryHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let a = Query::new("acme", "tool");
        let b = Query::new("acme", "tool");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().as_str().len(), 64);
    }

    #[test]
    fn test_every_field_partitions() {
        let base = Query::new("acme", "tool");
        let key = base.cache_key();

        let mut other = base.clone();
        other.release = "v1.0.0".to_string();
        assert_ne!(other.cache_key(), key);

        let mut other = base.clone();
        other.include = "musl".to_string();
        assert_ne!(other.cache_key(), key);

        let mut other = base.clone();
        other.insecure = true;
        assert_ne!(other.cache_key(), key);
    }

    #[test]
    fn test_token_partitions() {
        let mut a = Query::new("acme", "tool");
        let mut b = a.clone();
        a.token = "token-a".to_string();
        b.token = "token-b".to_string();
        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), Query::new("acme", "tool").cache_key());
    }
}
