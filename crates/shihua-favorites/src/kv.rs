use std::any::Any;
use std::io;

use async_trait::async_trait;

/// Key-value byte store backing the favorites collection.
///
/// Each call is atomic for its single key: a reader sees either the old or
/// the new value of a concurrent `set`, never a mix.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value under `key`; `None` if it was never written.
    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;
    /// Take the store-wide writer lock, waiting until it is free.
    ///
    /// `get` and `set` do not take it themselves; writers hold it across a
    /// whole read-modify-write cycle.
    async fn lock(&self) -> io::Result<KvLock>;
}

/// Exclusive writer access to a [`KvStore`]. Released on drop.
pub struct KvLock {
    _held: Box<dyn Any + Send + Sync>,
}

impl KvLock {
    pub fn new(held: impl Any + Send + Sync) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for KvLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KvLock")
    }
}

/// Reject keys that could escape a directory-backed store.
pub(crate) fn validate_key(key: &str) -> io::Result<()> {
    if key.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "storage key must not be empty",
        ));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") || key.starts_with('.') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage key: '{key}'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_key;

    #[test]
    fn test_validate_key_accepts_plain_names() {
        for key in ["savedPoems", "savedPoems.corrupt", "poems-2024"] {
            assert!(validate_key(key).is_ok(), "{key} should be accepted");
        }
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in ["", " ", "../x", "/tmp/x", "a/b", "a\\b", ".lock"] {
            let err = validate_key(key).unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "{key:?}");
        }
    }
}
