//! Cache key generation.

use crate::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Key for one memoized invocation: the operation name plus a digest of its
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub op: String,
    pub hash: String,
}

impl CacheKey {
    pub fn new(op: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            hash: hash.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.op, self.hash)
    }
}

/// Derives stable keys from operation arguments.
///
/// Arguments are serialized to JSON before hashing; serde_json's default map
/// representation is ordered by key, so logically equal argument sets always
/// produce the same digest.
pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self { salt: None }
    }

    /// Namespace keys, e.g. per account session, so instances sharing a
    /// backend cannot observe each other's entries.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn generate<A>(&self, op: &str, args: &A) -> Result<CacheKey>
    where
        A: Serialize + ?Sized,
    {
        let canonical = serde_json::to_string(args)?;
        let mut hasher = Sha256::new();
        hasher.update(op.as_bytes());
        hasher.update(b"\0");
        if let Some(ref salt) = self.salt {
            hasher.update(salt.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Ok(CacheKey::new(op, hash))
    }
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_equal_args_equal_keys() {
        let keys = CacheKeyGenerator::new();
        let a = keys.generate("members", &("group", 42u32)).unwrap();
        let b = keys.generate("members", &("group", 42u32)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_args_different_keys() {
        let keys = CacheKeyGenerator::new();
        let a = keys.generate("members", &("group", 42u32)).unwrap();
        let b = keys.generate("members", &("group", 43u32)).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_op_name_is_part_of_key() {
        let keys = CacheKeyGenerator::new();
        let a = keys.generate("members", &42u32).unwrap();
        let b = keys.generate("messages", &42u32).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_map_argument_order_is_canonical() {
        let keys = CacheKeyGenerator::new();
        let mut first = HashMap::new();
        first.insert("limit", 100);
        first.insert("offset", 0);
        let mut second = HashMap::new();
        second.insert("offset", 0);
        second.insert("limit", 100);
        let a = keys.generate("scan", &first).unwrap();
        let b = keys.generate("scan", &second).unwrap();
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn test_salt_separates_namespaces() {
        let plain = CacheKeyGenerator::new();
        let salted = CacheKeyGenerator::new().with_salt("session-a");
        let a = plain.generate("members", &42u32).unwrap();
        let b = salted.generate("members", &42u32).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_display_includes_op() {
        let keys = CacheKeyGenerator::new();
        let key = keys.generate("members", &1u8).unwrap();
        assert!(key.to_string().starts_with("members:"));
    }
}
