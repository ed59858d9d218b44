use crate::builder::MemoCacheBuilder;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::listener::EvictionReason;
use crate::loader::CachedValue;
use crate::metrics::Metrics;
use crate::request::FetchRequest;
use crate::shared::CacheShared;
use crate::sync::lock_or_cancel;
use crate::MetricsSnapshot;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use ahash::HashMap;
use futures_util::future;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An async memoization cache keyed by string.
///
/// Every structural operation runs under a single store-wide async lock,
/// and [`get_or_add`](Self::get_or_add) keeps that lock for the whole
/// nested fetch. Within an entry, a second lock makes fetching
/// single-flight; background refresh only takes the entry lock.
///
/// Call [`close`](Self::close) to dispose every entry. Dropping the cache
/// without closing it stops background refresh but skips disposal
/// contracts.
pub struct MemoCache {
  entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
  shared: Arc<CacheShared>,
}

impl fmt::Debug for MemoCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoCache")
      .field("shared", &self.shared)
      .finish_non_exhaustive()
  }
}

impl Default for MemoCache {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for MemoCache {
  fn drop(&mut self) {
    for entry in self.entries.get_mut().values() {
      entry.cancel();
    }
  }
}

impl MemoCache {
  /// Creates a cache with no listener that spawns refresh tasks on the
  /// ambient Tokio runtime.
  pub fn new() -> Self {
    MemoCacheBuilder::new().build()
  }

  pub fn builder() -> MemoCacheBuilder {
    MemoCacheBuilder::new()
  }

  pub(crate) fn from_shared(shared: CacheShared) -> Self {
    Self {
      entries: Mutex::new(HashMap::default()),
      shared: Arc::new(shared),
    }
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  /// Returns the value for `request.key()`, creating the entry and fetching
  /// as needed.
  ///
  /// The value is fetched when the entry is new or its value has expired.
  /// The request's policy is validated only when it creates the entry; for
  /// an existing key the request is ignored. Returns `Ok(None)` when the entry holds a value of a type other than
  /// `T`. A fetch failure is returned to this caller and the entry stays
  /// expired, so the next call retries.
  pub async fn get_or_add<T>(
    &self,
    request: FetchRequest<T>,
    cancel: &CancellationToken,
  ) -> Result<Option<Arc<T>>, CacheError>
  where
    T: Send + Sync + 'static,
  {
    let mut entries = lock_or_cancel(&self.entries, cancel, None).await?;
    let entry = match entries.get(request.key()).cloned() {
      Some(entry) => entry,
      None => {
        request.policy().validate()?;
        debug!(key = %request.key(), policy = ?request.policy(), "creating cache entry");
        let key = request.key().to_owned();
        let entry = Arc::new(CacheEntry::new(request, self.shared.clone()));
        entries.insert(key, entry.clone());
        entry
      }
    };

    let value = entry.get_or_fetch(cancel).await?;
    drop(entries);

    Ok(downcast(value))
  }

  /// Returns the current value for `key` without fetching or checking
  /// expiration.
  pub async fn get<T>(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Arc<T>>, CacheError>
  where
    T: Send + Sync + 'static,
  {
    let entries = lock_or_cancel(&self.entries, cancel, None).await?;
    Ok(entries.get(key).and_then(|entry| entry.current()).and_then(downcast))
  }

  /// Removes and disposes the entry for `key`. Returns whether an entry was
  /// present.
  pub async fn remove(&self, key: &str, cancel: &CancellationToken) -> Result<bool, CacheError> {
    let mut entries = lock_or_cancel(&self.entries, cancel, None).await?;
    let Some(entry) = entries.remove(key) else {
      return Ok(false);
    };

    debug!(key = %key, "removing cache entry");
    entry.dispose(EvictionReason::Removed).await;
    Metrics::incr(&self.shared.metrics.removals);
    Ok(true)
  }

  /// Returns a snapshot of the current keys.
  pub async fn keys(&self, cancel: &CancellationToken) -> Result<HashSet<String>, CacheError> {
    let entries = lock_or_cancel(&self.entries, cancel, None).await?;
    Ok(entries.keys().cloned().collect())
  }

  pub async fn contains_key(&self, key: &str, cancel: &CancellationToken) -> Result<bool, CacheError> {
    let entries = lock_or_cancel(&self.entries, cancel, None).await?;
    Ok(entries.contains_key(key))
  }

  pub async fn len(&self, cancel: &CancellationToken) -> Result<usize, CacheError> {
    let entries = lock_or_cancel(&self.entries, cancel, None).await?;
    Ok(entries.len())
  }

  /// Drains the cache and disposes every entry concurrently. The store
  /// lock is released before disposal starts. Calling `close` again, or
  /// using the cache afterwards, is allowed.
  pub async fn close(&self) {
    let drained: Vec<Arc<CacheEntry>> = {
      let mut entries = self.entries.lock().await;
      entries.drain().map(|(_, entry)| entry).collect()
    };
    if drained.is_empty() {
      return;
    }

    debug!(entries = drained.len(), "closing cache");
    future::join_all(drained.iter().map(|entry| entry.dispose(EvictionReason::Closed))).await;
  }
}

#[inline]
fn downcast<T: Send + Sync + 'static>(value: CachedValue) -> Option<Arc<T>> {
  value.downcast::<T>().ok()
}
