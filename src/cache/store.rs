//! Cache store with staleness invalidation driven by list responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SdkError};

use super::storage::KeyValueStore;
use super::traits::{CacheEntry, CacheStatus, Updatable};

/// Cache of individually keyed entities.
///
/// Entries are never deleted. A list response that reveals a newer `updated_at`
/// for a cached key marks that entry invalid; the next single fetch repopulates it.
#[derive(Clone)]
pub struct CacheStore {
  storage: Arc<dyn KeyValueStore>,
  /// One writer per key at a time.
  key_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CacheStore {
  pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
    Self {
      storage,
      key_locks: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// `{resource}/{id}`
  pub fn key(resource: &str, id: u64) -> String {
    format!("{}/{}", resource, id)
  }

  /// Look up an entry; `None` if nothing was ever stored under `key`.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
    match self.storage.get(key)? {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  /// Unconditionally overwrite the entry under `key`.
  pub fn set<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> Result<()> {
    self.with_key_lock(key, || self.write(key, entry))
  }

  /// Mark entries stale when an updatable carries a strictly newer timestamp.
  ///
  /// Keys with no entry are ignored. Returns how many valid entries were invalidated.
  pub fn process(&self, updatables: &[Updatable]) -> Result<usize> {
    let mut invalidated = 0;

    for updatable in updatables {
      if self.with_key_lock(&updatable.key, || self.invalidate(updatable))? {
        invalidated += 1;
      }
    }

    Ok(invalidated)
  }

  /// Caller holds the key lock.
  fn invalidate(&self, updatable: &Updatable) -> Result<bool> {
    // Payload shape doesn't matter here, only the timestamp.
    let Some(mut entry) = self.get::<Value>(&updatable.key)? else {
      return Ok(false);
    };

    // Already stale entries stay stale; only count real transitions.
    if !entry.is_valid() || !is_newer(&entry.updated_at, &updatable.updated_at) {
      return Ok(false);
    }

    entry.status = CacheStatus::Invalid;
    self.write(&updatable.key, &entry)?;
    debug!(
      key = %updatable.key,
      cached = %entry.updated_at,
      seen = %updatable.updated_at,
      "Cache entry invalidated"
    );
    Ok(true)
  }

  fn write<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> Result<()> {
    let raw = serde_json::to_string(entry)?;
    self.storage.set(key, &raw)
  }

  /// Run `f` as the only writer of `key`.
  fn with_key_lock<R>(&self, key: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
    let lock = {
      let mut locks = self.locks();
      Arc::clone(locks.entry(key.to_string()).or_default())
    };

    let result = match lock.lock() {
      Ok(_guard) => f(),
      Err(e) => Err(SdkError::Cache(format!("Lock poisoned: {}", e))),
    };

    // Drop the entry once neither another writer nor a waiter holds it. Our handle
    // goes away under the map lock so the last releaser always sees a count of 2.
    let mut locks = self.locks();
    if Arc::strong_count(&lock) == 2 {
      locks.remove(key);
    }
    drop(lock);
    drop(locks);
    result
  }

  fn locks(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    self
      .key_locks
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl std::fmt::Debug for CacheStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CacheStore").finish_non_exhaustive()
  }
}

/// True if `incoming` is a strictly later instant than `stored`.
/// Unparseable timestamps never invalidate.
fn is_newer(stored: &str, incoming: &str) -> bool {
  match (parse_timestamp(stored), parse_timestamp(incoming)) {
    (Some(stored), Some(incoming)) => stored < incoming,
    _ => false,
  }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for format in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
  ] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Some(dt.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}
