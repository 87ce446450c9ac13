//! In-memory cache storage with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single cached value and when it stops being visible.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub value: T,
  /// None = never expires
  pub expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
  /// Create an entry expiring `ttl_seconds` from now, or never when `None`.
  pub fn new(value: T, ttl_seconds: Option<u64>) -> Self {
    Self {
      value,
      expires_at: ttl_seconds.map(|ttl| Instant::now() + Duration::from_secs(ttl)),
    }
  }

  /// An entry is expired once `now >= expires_at`.
  pub fn is_expired(&self) -> bool {
    match self.expires_at {
      Some(expires_at) => Instant::now() >= expires_at,
      None => false,
    }
  }
}

/// Key-value store with lazy expiry.
///
/// There is no background sweeper: expired entries are removed when a read
/// finds them, and entries that are never read again stay until `clear`.
pub struct MemoryStorage<T> {
  entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> MemoryStorage<T> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
    // No operation leaves the map half-written, so a poisoned lock is still usable.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Get a value, purging it first if it has expired.
  pub fn get(&self, key: &str) -> Option<T> {
    let mut entries = self.entries();

    match entries.get(key) {
      Some(entry) if entry.is_expired() => {
        entries.remove(key);
        None
      }
      Some(entry) => Some(entry.value.clone()),
      None => None,
    }
  }

  /// Store a value.
  ///
  /// * `None` - the entry never expires
  /// * `Some(0)` - caching is disabled for this write; any existing entry is dropped
  /// * `Some(n)` - the entry expires `n` seconds from now
  pub fn set(&self, key: &str, value: T, ttl_seconds: Option<u64>) {
    if ttl_seconds == Some(0) {
      self.delete(key);
      return;
    }

    self
      .entries()
      .insert(key.to_string(), CacheEntry::new(value, ttl_seconds));
  }

  /// Remove an entry. Returns whether one was present.
  pub fn delete(&self, key: &str) -> bool {
    self.entries().remove(key).is_some()
  }

  /// Remove every entry.
  pub fn clear(&self) {
    self.entries().clear();
  }

  /// Number of stored entries, expired-but-unread ones included.
  #[allow(dead_code)]
  pub fn len(&self) -> usize {
    self.entries().len()
  }
}

impl<T: Clone> Default for MemoryStorage<T> {
  fn default() -> Self {
    Self::new()
  }
}
