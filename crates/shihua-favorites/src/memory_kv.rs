use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::kv::{KvLock, KvStore, validate_key};

/// In-process [`KvStore`].
///
/// Clones share the same map, so a test can keep a handle after moving one
/// into a store. Failures can be injected for the next `get` or `set`.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<Mutex<MemoryInner>>,
    writer: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, Vec<u8>>,
    set_calls: usize,
    fail_next_get: Option<io::ErrorKind>,
    fail_next_set: Option<io::ErrorKind>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` directly, bypassing the write counter.
    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        if let Ok(mut inner) = self.state() {
            inner.values.insert(key.to_string(), value.into());
        }
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state().ok()?.values.get(key).cloned()
    }

    /// Keys currently holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state()
            .map(|inner| inner.values.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of `set` calls that reached the map.
    pub fn set_calls(&self) -> usize {
        self.state().map(|inner| inner.set_calls).unwrap_or_default()
    }

    pub fn fail_next_get(&self, kind: io::ErrorKind) {
        if let Ok(mut inner) = self.state() {
            inner.fail_next_get = Some(kind);
        }
    }

    pub fn fail_next_set(&self, kind: io::ErrorKind) {
        if let Ok(mut inner) = self.state() {
            inner.fail_next_set = Some(kind);
        }
    }

    fn state(&self) -> io::Result<MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("memory kv store poisoned"))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let mut inner = self.state()?;
        if let Some(kind) = inner.fail_next_get.take() {
            return Err(io::Error::new(kind, "injected get failure"));
        }
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        validate_key(key)?;
        let mut inner = self.state()?;
        if let Some(kind) = inner.fail_next_set.take() {
            return Err(io::Error::new(kind, "injected set failure"));
        }
        inner.set_calls += 1;
        inner.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn lock(&self) -> io::Result<KvLock> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        Ok(KvLock::new(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let kv = MemoryKvStore::new();
        assert!(kv.get("savedPoems").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_shared_between_clones() {
        let kv = MemoryKvStore::new();
        let handle = kv.clone();
        kv.set("savedPoems", b"[]").await.unwrap();
        assert_eq!(handle.get("savedPoems").await.unwrap().unwrap(), b"[]");
        assert_eq!(handle.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_fire_once() {
        let kv = MemoryKvStore::new();
        kv.fail_next_set(io::ErrorKind::StorageFull);
        let err = kv.set("savedPoems", b"[]").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
        assert!(kv.set("savedPoems", b"[]").await.is_ok());

        kv.fail_next_get(io::ErrorKind::PermissionDenied);
        assert!(kv.get("savedPoems").await.is_err());
        assert!(kv.get("savedPoems").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lock_is_shared_between_clones() {
        let kv = MemoryKvStore::new();
        let other = kv.clone();

        let guard = KvStore::lock(&kv).await.unwrap();
        let waiter = tokio::spawn(async move { KvStore::lock(&other).await.map(|_| ()) });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap().unwrap();
    }

    #[test]
    fn test_insert_raw_does_not_count_as_set() {
        let kv = MemoryKvStore::new();
        kv.insert_raw("savedPoems", "garbage");
        assert_eq!(kv.raw("savedPoems").unwrap(), b"garbage");
        assert_eq!(kv.set_calls(), 0);
        assert_eq!(kv.keys(), vec!["savedPoems".to_string()]);
    }
}
