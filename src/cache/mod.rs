//! Client-side entity cache.
//!
//! This module provides a transport-agnostic cache that:
//! - Stores single entities under `{resource}/{id}` keys with their `updated_at`
//! - Marks entries stale when a list response shows a newer `updated_at`
//! - Persists through any string key-value backend (memory, SQLite, or none)

mod storage;
mod store;
mod traits;

pub use storage::{KeyValueStore, MemoryStorage, NoopStorage, SqliteStorage};
pub use store::CacheStore;
pub use traits::{CacheEntry, CacheStatus, Cacheable, Updatable};
