//! Directory-backed [`KvStore`]: one `{key}.json` file per key.
//!
//! ```text
//! {dir}/
//! ├── .lock              (flock held by writers across read-modify-write)
//! ├── savedPoems.json
//! └── savedPoems.corrupt-20240301T083000.json
//! ```
//!
//! Writes go through temp-file + rename, so readers never observe a
//! partially written value.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::kv::{KvLock, KvStore, validate_key};

const LOCK_FILE: &str = ".lock";
const VALUE_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value for `key`.
    pub fn value_path(&self, key: &str) -> io::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.value_path(key)?;
        tokio::task::spawn_blocking(move || read_value(&path))
            .await
            .map_err(io::Error::other)?
    }

    async fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.value_path(key)?;
        let dir = self.dir.clone();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || write_value(&dir, &path, &value))
            .await
            .map_err(io::Error::other)?
    }

    async fn lock(&self) -> io::Result<KvLock> {
        let dir = self.dir.clone();
        let (acquired_tx, acquired_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        // The flock guard borrows its file, so it lives on this blocking
        // thread until the returned KvLock drops the release sender.
        tokio::task::spawn_blocking(move || {
            let lock_file = match open_lock_file(&dir) {
                Ok(file) => file,
                Err(e) => {
                    let _ = acquired_tx.send(Err(e));
                    return;
                }
            };
            let mut lock = fd_lock::RwLock::new(lock_file);
            match lock.write() {
                Ok(_guard) => {
                    if acquired_tx.send(Ok(())).is_ok() {
                        // Returns once the sender is dropped.
                        let _ = release_rx.recv();
                    }
                }
                Err(e) => {
                    let _ = acquired_tx.send(Err(e));
                }
            }
        });

        acquired_rx.await.map_err(io::Error::other)??;
        debug!(dir = %self.dir.display(), "acquired kv write lock");
        Ok(KvLock::new(release_tx))
    }
}

fn read_value(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), len = bytes.len(), "read kv value");
            Ok(Some(bytes))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_value(dir: &Path, target: &Path, value: &[u8]) -> io::Result<()> {
    ensure_storage_dir(dir)?;
    atomic_write(dir, target, value)?;
    debug!(path = %target.display(), len = value.len(), "wrote kv value");
    Ok(())
}

fn open_lock_file(dir: &Path) -> io::Result<fs::File> {
    ensure_storage_dir(dir)?;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(dir.join(LOCK_FILE))
}

/// Write data to a file atomically using temp-file + rename.
fn atomic_write(dir: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn ensure_storage_dir(dir: &Path) -> io::Result<()> {
    let existed = dir.exists();
    fs::create_dir_all(dir)?;
    if !existed {
        set_dir_mode_700(dir)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_mode_700(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_dir_mode_700(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_get_before_any_write_is_none() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path().join("favorites"));
        assert!(kv.get("savedPoems").await.unwrap().is_none());
        assert!(!kv.dir().exists(), "reads must not create the directory");
    }

    #[tokio::test]
    async fn test_set_creates_dir_and_roundtrips() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path().join("nested").join("favorites"));
        kv.set("savedPoems", b"[1,2,3]").await.unwrap();

        let path = kv.value_path("savedPoems").unwrap();
        assert_eq!(path.file_name().unwrap(), "savedPoems.json");
        assert_eq!(fs::read(&path).unwrap(), b"[1,2,3]");
        assert_eq!(kv.get("savedPoems").await.unwrap().unwrap(), b"[1,2,3]");
    }

    #[tokio::test]
    async fn test_set_replaces_whole_value_without_leftovers() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path());
        kv.set("savedPoems", b"a much longer first value").await.unwrap();
        kv.set("savedPoems", b"short").await.unwrap();
        assert_eq!(kv.get("savedPoems").await.unwrap().unwrap(), b"short");

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["savedPoems.json".to_string()]);
    }

    #[tokio::test]
    async fn test_lock_creates_lock_file() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path().join("favorites"));
        let guard = kv.lock().await.unwrap();
        assert!(kv.dir().join(LOCK_FILE).exists());
        drop(guard);
        kv.lock().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lock_excludes_other_handles_until_dropped() {
        let dir = tempdir().unwrap();
        let first = FileKvStore::new(dir.path());
        let second = FileKvStore::new(dir.path());

        let guard = first.lock().await.unwrap();
        let waiter = tokio::spawn(async move { second.lock().await.map(|_| ()) });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!waiter.is_finished(), "second handle must wait for the lock");

        drop(guard);
        tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path());
        kv.set("savedPoems", b"one").await.unwrap();
        kv.set("savedPoems.corrupt", b"two").await.unwrap();
        assert_eq!(kv.get("savedPoems").await.unwrap().unwrap(), b"one");
        assert_eq!(kv.get("savedPoems.corrupt").await.unwrap().unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path());
        let err = kv.set("../escape", b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(kv.get("a/b").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_dir_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path().join("private"));
        kv.set("savedPoems", b"[]").await.unwrap();
        let mode = fs::metadata(kv.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_read_error_other_than_missing_propagates() {
        let dir = tempdir().unwrap();
        let kv = FileKvStore::new(dir.path());
        // A directory where the value file should be cannot be read as bytes.
        fs::create_dir_all(kv.value_path("savedPoems").unwrap()).unwrap();
        assert!(kv.get("savedPoems").await.is_err());
    }
}
