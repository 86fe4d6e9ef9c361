//! Durable, newest-first collection of favorite poems.
//!
//! [`FavoritesStore`] is the only way to read or change the collection. It
//! keeps the whole collection under one key of a [`KvStore`] and rewrites it
//! on every mutation.

mod collection;
mod file_kv;
mod kv;
mod memory_kv;
mod store;

pub use file_kv::FileKvStore;
pub use kv::{KvLock, KvStore};
pub use memory_kv::MemoryKvStore;
pub use store::{FavoritesStore, Listing};
