//! Core traits and types for the caching system.

use serde::{Deserialize, Serialize};

/// Trait for entities whose cached copies can be invalidated by list responses.
///
/// Implementors expose their identifier and the server-reported modification time.
pub trait Cacheable {
  /// Identifier within the resource (e.g. page id)
  fn id(&self) -> u64;

  /// Last modification timestamp as reported by the server.
  /// Returns None if the entity doesn't track modification time.
  fn updated_at(&self) -> Option<&str>;
}

/// Freshness flag of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
  Invalid,
  Valid,
}

/// One cached resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  /// The last-known decoded entity
  pub item: T,
  /// Server-reported modification time when the entry was written
  pub updated_at: String,
  pub status: CacheStatus,
}

impl<T> CacheEntry<T> {
  /// A freshly fetched entry.
  pub fn valid(item: T, updated_at: impl Into<String>) -> Self {
    Self {
      item,
      updated_at: updated_at.into(),
      status: CacheStatus::Valid,
    }
  }

  pub fn is_valid(&self) -> bool {
    self.status == CacheStatus::Valid
  }
}

/// Evidence from a list response that a keyed entity changed at `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updatable {
  pub key: String,
  pub updated_at: String,
}

impl Updatable {
  pub fn new(key: impl Into<String>, updated_at: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      updated_at: updated_at.into(),
    }
  }
}
