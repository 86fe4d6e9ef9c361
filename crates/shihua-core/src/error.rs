/// Failures reported by favorites operations.
///
/// Every variant is scoped to the single operation that produced it.
#[derive(thiserror::Error, Debug)]
pub enum FavoritesError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt favorites collection under key '{key}': {reason}")]
    CorruptStore { key: String, reason: String },

    #[error("Persistence {op} failed for key '{key}': {source}")]
    PersistenceIo {
        key: String,
        /// `get`, `set` or `lock`.
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FavoritesError {
    pub fn io_get(key: &str, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            key: key.to_string(),
            op: "get",
            source,
        }
    }

    pub fn io_set(key: &str, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            key: key.to_string(),
            op: "set",
            source,
        }
    }

    pub fn io_lock(key: &str, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            key: key.to_string(),
            op: "lock",
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptStore { .. })
    }
}
