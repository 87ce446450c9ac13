//! Cache layer that orchestrates TTL caching with single-flight fetching.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use super::storage::MemoryStorage;
use super::traits::QueryKey;
use crate::error::Result;

/// An in-flight fetch that every concurrent caller of a key awaits.
type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

struct PendingFetch<T> {
  /// Registration id, so a settled fetch never removes a newer registration
  id: u64,
  fetch: SharedFetch<T>,
}

type PendingTable<T> = Mutex<HashMap<String, PendingFetch<T>>>;

fn lock<T>(pending: &PendingTable<T>) -> MutexGuard<'_, HashMap<String, PendingFetch<T>>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a pending-fetch record when the fetch settles or is dropped.
struct PendingGuard<T> {
  pending: Arc<PendingTable<T>>,
  key: String,
  id: u64,
}

impl<T> Drop for PendingGuard<T> {
  fn drop(&mut self) {
    let mut pending = lock(&self.pending);
    if pending.get(&self.key).is_some_and(|p| p.id == self.id) {
      pending.remove(&self.key);
    }
  }
}

/// Cache layer in front of network fetchers.
///
/// Values live in a [`MemoryStorage`] with per-entry TTL. Concurrent misses on
/// the same key share one fetch: the first caller registers it and everyone
/// arriving before it settles awaits the same result or the same error.
pub struct CacheLayer<T> {
  storage: Arc<MemoryStorage<T>>,
  pending: Arc<PendingTable<T>>,
  next_id: Arc<AtomicU64>,
}

impl<T> CacheLayer<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      storage: Arc::new(MemoryStorage::new()),
      pending: Arc::new(Mutex::new(HashMap::new())),
      next_id: Arc::new(AtomicU64::new(0)),
    }
  }

  #[allow(dead_code)]
  pub fn get(&self, key: &str) -> Option<T> {
    self.storage.get(key)
  }

  /// Drop all entries and forget all in-flight fetches.
  ///
  /// Fetches already running are not cancelled: when they finish they still
  /// store their result, so a value fetched before the clear can reappear.
  /// Callers arriving after the clear start a fresh fetch instead of joining
  /// the old one.
  pub fn clear(&self) {
    self.storage.clear();
    lock(&self.pending).clear();
  }

  /// Get a cached value or populate it with `fetcher`.
  ///
  /// 1. `ttl_seconds == 0` - always call `fetcher`, no caching, no sharing
  /// 2. Fresh entry in storage - return it
  /// 3. Fetch already in flight for `key` - await that one
  /// 4. Otherwise start a fetch, store a successful result with the TTL
  ///
  /// Failures are never cached; the next caller after a failure retries.
  pub async fn get_or_set<F, Fut>(&self, key: &str, ttl_seconds: u64, fetcher: F) -> Result<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    if ttl_seconds == 0 {
      trace!(key, "cache bypassed");
      return fetcher().await;
    }

    if let Some(value) = self.storage.get(key) {
      trace!(key, "cache hit");
      return Ok(value);
    }

    // Checking and registering happen under one lock with no await in
    // between, so two callers can never both start a fetch for the same key.
    let fetch = {
      let mut pending = lock(&self.pending);

      if let Some(existing) = pending.get(key) {
        debug!(key, "joining in-flight fetch");
        existing.fetch.clone()
      } else {
        debug!(key, "cache miss, fetching");
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = PendingGuard {
          pending: Arc::clone(&self.pending),
          key: key.to_string(),
          id,
        };
        let storage = Arc::clone(&self.storage);
        let work = fetcher();

        let fetch = async move {
          let result = work.await;
          if let Ok(value) = &result {
            storage.set(&guard.key, value.clone(), Some(ttl_seconds));
          }
          drop(guard);
          result
        }
        .boxed()
        .shared();

        pending.insert(
          key.to_string(),
          PendingFetch {
            id,
            fetch: fetch.clone(),
          },
        );
        fetch
      }
    };

    fetch.await
  }

  /// [`get_or_set`](Self::get_or_set) keyed by a [`QueryKey`].
  pub async fn fetch<K, F, Fut>(&self, query: &K, ttl_seconds: u64, fetcher: F) -> Result<T>
  where
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let key = query.cache_key();
    trace!(key = %key, query = %query.description(), "cached query");
    self.get_or_set(&key, ttl_seconds, fetcher).await
  }
}

impl<T> Clone for CacheLayer<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      pending: Arc::clone(&self.pending),
      next_id: Arc::clone(&self.next_id),
    }
  }
}

impl<T> Default for CacheLayer<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::MocoError;
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;

  /// Fetcher that counts invocations and resolves after `delay`.
  fn counting_fetcher(
    calls: &Arc<AtomicUsize>,
    value: u32,
    delay: Duration,
  ) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> {
    let calls = Arc::clone(calls);
    move || {
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        if !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
        Ok(value)
      }
      .boxed()
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_value_reused_within_ttl_and_refetched_after() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache
      .get_or_set("k", 1, counting_fetcher(&calls, 1, Duration::ZERO))
      .await
      .unwrap();
    let second = cache
      .get_or_set("k", 1, counting_fetcher(&calls, 2, Duration::ZERO))
      .await
      .unwrap();
    assert_eq!((first, second), (1, 1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_millis(1000)).await;

    let third = cache
      .get_or_set("k", 1, counting_fetcher(&calls, 3, Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(third, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_ttl_always_fetches() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_set("k", 0, counting_fetcher(&calls, 1, Duration::ZERO))
      .await
      .unwrap();
    cache
      .get_or_set("k", 0, counting_fetcher(&calls, 1, Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Concurrent callers are not de-duplicated either
    let delay = Duration::from_millis(50);
    let (a, b) = tokio::join!(
      cache.get_or_set("k", 0, counting_fetcher(&calls, 1, delay)),
      cache.get_or_set("k", 0, counting_fetcher(&calls, 1, delay)),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(cache.get("k"), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_callers_share_one_fetch() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let delay = Duration::from_millis(100);

    let callers = (0..10).map(|i| cache.get_or_set("k", 60, counting_fetcher(&calls, i, delay)));
    let results = futures::future::join_all(callers).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Everyone sees the first registered fetcher's value
    assert!(results.iter().all(|r| r == &Ok(0)));
    assert_eq!(cache.get("k"), Some(0));
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_shared_and_not_cached() {
    let cache: CacheLayer<u32> = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let failing = || {
      let calls = Arc::clone(&calls);
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(MocoError::http(500, "Internal Server Error"))
      }
    };

    let (a, b, c) = tokio::join!(
      cache.get_or_set("k", 60, failing()),
      cache.get_or_set("k", 60, failing()),
      cache.get_or_set("k", 60, failing()),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let expected = Err(MocoError::http(500, "Internal Server Error"));
    assert_eq!(a, expected);
    assert_eq!(b, expected);
    assert_eq!(c, expected);

    // The pending record is gone, so the next caller retries from scratch
    let retried = cache
      .get_or_set("k", 60, counting_fetcher(&calls, 7, Duration::ZERO))
      .await;
    assert_eq!(retried, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_forces_refetch() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_set("k", 300, counting_fetcher(&calls, 1, Duration::ZERO))
      .await
      .unwrap();
    cache.clear();
    let value = cache
      .get_or_set("k", 300, counting_fetcher(&calls, 2, Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(value, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_during_fetch_does_not_cancel_it() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let slow = {
      let cache = cache.clone();
      let fetcher = counting_fetcher(&calls, 1, Duration::from_secs(5));
      tokio::spawn(async move { cache.get_or_set("k", 300, fetcher).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.clear();

    // A caller after the clear does not join the old in-flight fetch
    let fresh = cache
      .get_or_set("k", 300, counting_fetcher(&calls, 2, Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(fresh, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The old fetch still completes and repopulates the store
    assert_eq!(slow.await.unwrap(), Ok(1));
    assert_eq!(cache.get("k"), Some(1));
  }

  #[tokio::test]
  async fn test_pending_record_removed_after_settle() {
    let cache = CacheLayer::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_set("k", 60, counting_fetcher(&calls, 1, Duration::ZERO))
      .await
      .unwrap();

    assert!(lock(&cache.pending).is_empty());
  }
}
