use chrono::Utc;
use shihua_config::StorageConfig;
use shihua_config::config::DEFAULT_COLLECTION_KEY;
use shihua_core::{CorruptPolicy, FavoritesError, PoemRecord, SavedPoemEntry};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ulid::{Generator, Ulid};

use crate::collection;
use crate::file_kv::FileKvStore;
use crate::kv::{KvLock, KvStore};

const CORRUPT_MARKER: &str = "corrupt";

/// Favorites collection persisted under a single key.
///
/// Every mutation is load-full → transform → persist-full. The cycle runs
/// under an internal async mutex and the backend's writer lock
/// ([`KvStore::lock`]), so concurrent `save`/`remove` calls never drop each
/// other's changes, even from separate processes sharing one directory.
/// Reads take no lock: the backend's single-key atomicity means `list` sees
/// either the old or the new collection.
pub struct FavoritesStore<K> {
    kv: K,
    key: String,
    policy: CorruptPolicy,
    /// Guards the read-modify-write cycle; also owns the monotonic id source.
    writer: Mutex<Generator>,
}

/// Result of [`FavoritesStore::list_with_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Saved entries, newest first.
    pub entries: Vec<SavedPoemEntry>,
    /// Why the stored collection could not be decoded, when `FailOpen`
    /// treated it as empty. The next save backs the bytes up first.
    pub recovered_from: Option<String>,
}

/// Outcome of reading the collection key.
enum Loaded {
    Entries(Vec<SavedPoemEntry>),
    Corrupt { raw: Vec<u8>, reason: String },
}

impl FavoritesStore<FileKvStore> {
    /// Open the file-backed store described by `config`.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(FileKvStore::new(config.favorites_dir()))
            .with_key(config.collection_key.clone())
            .with_corrupt_policy(config.corrupt_policy)
    }
}

impl<K: KvStore> FavoritesStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            key: DEFAULT_COLLECTION_KEY.to_string(),
            policy: CorruptPolicy::default(),
            writer: Mutex::new(Generator::new()),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn corrupt_policy(&self) -> CorruptPolicy {
        self.policy
    }

    /// Common prefix of the keys that receive undecodable bytes before they
    /// are overwritten. Each backup gets its own timestamped key.
    pub fn corrupt_key_prefix(&self) -> String {
        format!("{}.{CORRUPT_MARKER}-", self.key)
    }

    /// All saved entries, newest first.
    ///
    /// A key that was never written yields an empty list. Undecodable data
    /// yields an empty list under `FailOpen` and `CorruptStore` under
    /// `FailClosed`.
    pub async fn list(&self) -> Result<Vec<SavedPoemEntry>, FavoritesError> {
        Ok(self.list_with_status().await?.entries)
    }

    /// Like [`list`](Self::list), but also reports whether the stored
    /// collection was unreadable and treated as empty.
    pub async fn list_with_status(&self) -> Result<Listing, FavoritesError> {
        match self.load().await? {
            Loaded::Entries(entries) => Ok(Listing {
                entries,
                recovered_from: None,
            }),
            Loaded::Corrupt { reason, .. } => {
                self.recover(reason.clone())?;
                Ok(Listing {
                    entries: Vec::new(),
                    recovered_from: Some(reason),
                })
            }
        }
    }

    /// Save `poem` with the image it was generated from and return the new
    /// entry, which becomes the first element of the collection.
    pub async fn save(
        &self,
        poem: PoemRecord,
        image_reference: &str,
    ) -> Result<SavedPoemEntry, FavoritesError> {
        poem.validate()?;
        if image_reference.trim().is_empty() {
            return Err(FavoritesError::InvalidInput(
                "image reference must not be empty".to_string(),
            ));
        }

        let mut ids = self.writer.lock().await;
        let _kv_lock = self.lock_backend().await?;
        let mut entries = match self.load().await? {
            Loaded::Entries(entries) => entries,
            Loaded::Corrupt { raw, reason } => {
                self.recover(reason)?;
                self.preserve_corrupt(&raw).await?;
                Vec::new()
            }
        };

        let entry = SavedPoemEntry {
            id: next_unique_id(&mut ids, &entries),
            poem,
            image_reference: image_reference.to_string(),
            saved_at: Utc::now(),
        };
        entries.insert(0, entry.clone());
        self.persist(&entries).await?;

        info!(
            id = %entry.id,
            title = %entry.poem.title,
            total = entries.len(),
            "saved favorite poem"
        );
        Ok(entry)
    }

    /// Remove the entry with `id`. Returns `false` when no entry matched.
    ///
    /// Nothing is written when no entry matched.
    pub async fn remove(&self, id: &str) -> Result<bool, FavoritesError> {
        let _guard = self.writer.lock().await;
        let _kv_lock = self.lock_backend().await?;
        let mut entries = match self.load().await? {
            Loaded::Entries(entries) => entries,
            Loaded::Corrupt { reason, .. } => {
                // An unreadable collection contains nothing to remove.
                self.recover(reason)?;
                return Ok(false);
            }
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            debug!(id, "no favorite with this id, skipping write");
            return Ok(false);
        }

        self.persist(&entries).await?;
        info!(id, total = entries.len(), "removed favorite poem");
        Ok(true)
    }

    async fn lock_backend(&self) -> Result<KvLock, FavoritesError> {
        self.kv
            .lock()
            .await
            .map_err(|e| FavoritesError::io_lock(&self.key, e))
    }

    async fn load(&self) -> Result<Loaded, FavoritesError> {
        let Some(raw) = self
            .kv
            .get(&self.key)
            .await
            .map_err(|e| FavoritesError::io_get(&self.key, e))?
        else {
            debug!(key = %self.key, "favorites collection never written");
            return Ok(Loaded::Entries(Vec::new()));
        };

        match collection::decode(&raw) {
            Ok(entries) => {
                debug!(key = %self.key, count = entries.len(), "loaded favorites");
                Ok(Loaded::Entries(entries))
            }
            Err(reason) => Ok(Loaded::Corrupt { raw, reason }),
        }
    }

    /// Apply the corrupt-data policy: `Ok` means carry on as if empty.
    fn recover(&self, reason: String) -> Result<(), FavoritesError> {
        match self.policy {
            CorruptPolicy::FailOpen => {
                warn!(
                    key = %self.key,
                    %reason,
                    "favorites collection is corrupt, treating it as empty"
                );
                Ok(())
            }
            CorruptPolicy::FailClosed => Err(FavoritesError::CorruptStore {
                key: self.key.clone(),
                reason,
            }),
        }
    }

    /// Copy undecodable bytes to a fresh backup key. Earlier backups are
    /// never overwritten.
    async fn preserve_corrupt(&self, raw: &[u8]) -> Result<(), FavoritesError> {
        let corrupt_key = self.free_corrupt_key().await?;
        self.kv
            .set(&corrupt_key, raw)
            .await
            .map_err(|e| FavoritesError::io_set(&corrupt_key, e))?;
        warn!(
            key = %self.key,
            backup = %corrupt_key,
            len = raw.len(),
            "preserved corrupt favorites collection before overwrite"
        );
        Ok(())
    }

    async fn free_corrupt_key(&self) -> Result<String, FavoritesError> {
        let base = format!(
            "{}{}",
            self.corrupt_key_prefix(),
            Utc::now().format("%Y%m%dT%H%M%S")
        );
        let mut candidate = base.clone();
        let mut attempt = 1;
        while self
            .kv
            .get(&candidate)
            .await
            .map_err(|e| FavoritesError::io_get(&candidate, e))?
            .is_some()
        {
            candidate = format!("{base}-{attempt}");
            attempt += 1;
        }
        Ok(candidate)
    }

    async fn persist(&self, entries: &[SavedPoemEntry]) -> Result<(), FavoritesError> {
        let bytes = collection::encode(entries)
            .map_err(|e| FavoritesError::io_set(&self.key, std::io::Error::other(e)))?;
        self.kv
            .set(&self.key, &bytes)
            .await
            .map_err(|e| FavoritesError::io_set(&self.key, e))
    }
}

/// Next id from the monotonic generator that is not already in `entries`.
fn next_unique_id(ids: &mut Generator, entries: &[SavedPoemEntry]) -> String {
    loop {
        let id = ids.generate().unwrap_or_else(|_| Ulid::new()).to_string();
        if !entries.iter().any(|entry| entry.id == id) {
            return id;
        }
    }
}
