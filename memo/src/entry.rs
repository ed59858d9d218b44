use crate::error::CacheError;
use crate::listener::EvictionReason;
use crate::loader::{CachedValue, Disposer, Fetcher};
use crate::metrics::Metrics;
use crate::policy::FetchPolicy;
use crate::request::FetchRequest;
use crate::shared::CacheShared;
use crate::sync::lock_or_cancel;
use crate::task::refresh;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// The value currently held by an entry and when it was fetched.
/// `value` and `fetched_at` are always both set or both empty.
#[derive(Default)]
struct Slot {
  value: Option<CachedValue>,
  fetched_at: Option<Instant>,
}

impl Slot {
  #[inline]
  fn is_expired(&self, lifetime: Duration, now: Instant) -> bool {
    match self.fetched_at {
      None => true,
      // A lifetime too large to represent never expires.
      Some(at) => at.checked_add(lifetime).is_some_and(|deadline| now >= deadline),
    }
  }
}

/// One key's cached value together with its fetch and refresh state.
pub(crate) struct CacheEntry {
  key: String,
  policy: FetchPolicy,
  fetcher: Fetcher,
  disposer: Option<Disposer>,
  /// Serializes fetch attempts for this key, including background refreshes.
  fetch_lock: tokio::sync::Mutex<()>,
  /// Short critical sections only; never held across an await.
  slot: Mutex<Slot>,
  refresh_armed: AtomicBool,
  /// Cancelled when the entry is disposed. Background refresh fetches run
  /// under this token.
  lifecycle: CancellationToken,
  pub(crate) shared: Arc<CacheShared>,
}

impl fmt::Debug for CacheEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheEntry")
      .field("key", &self.key)
      .field("policy", &self.policy)
      .field("refresh_armed", &self.refresh_armed.load(Ordering::Relaxed))
      .field("disposed", &self.lifecycle.is_cancelled())
      .finish_non_exhaustive()
  }
}

impl CacheEntry {
  pub(crate) fn new<T>(request: FetchRequest<T>, shared: Arc<CacheShared>) -> Self {
    Self {
      key: request.key,
      policy: request.policy,
      fetcher: request.fetcher,
      disposer: request.disposer,
      fetch_lock: tokio::sync::Mutex::new(()),
      slot: Mutex::new(Slot::default()),
      refresh_armed: AtomicBool::new(false),
      lifecycle: CancellationToken::new(),
      shared,
    }
  }

  #[inline]
  pub(crate) fn key(&self) -> &str {
    &self.key
  }

  /// Returns the current value without fetching or checking expiration.
  pub(crate) fn current(&self) -> Option<CachedValue> {
    self.slot.lock().value.clone()
  }

  /// When the current value expires. `None` if there is no value or the
  /// deadline is not representable.
  pub(crate) fn expires_at(&self) -> Option<Instant> {
    let slot = self.slot.lock();
    slot.value.as_ref()?;
    slot.fetched_at?.checked_add(self.policy.lifetime)
  }

  #[inline]
  fn disposes_values(&self) -> bool {
    self.policy.allow_dispose && self.disposer.is_some()
  }

  /// Returns the cached value, fetching it first if it has expired, then
  /// arms background refresh if the policy asks for it.
  pub(crate) async fn get_or_fetch(self: &Arc<Self>, cancel: &CancellationToken) -> Result<CachedValue, CacheError> {
    let value = self.fetch_if_expired(cancel).await?;
    self.arm_refresh();
    Ok(value)
  }

  /// The single-flight core. Holds the entry lock for the whole
  /// check-dispose-fetch-store sequence.
  pub(crate) async fn fetch_if_expired(&self, cancel: &CancellationToken) -> Result<CachedValue, CacheError> {
    let _guard = lock_or_cancel(&self.fetch_lock, cancel, Some(&self.lifecycle)).await?;

    {
      let slot = self.slot.lock();
      if let (Some(value), false) = (&slot.value, slot.is_expired(self.policy.lifetime, Instant::now())) {
        Metrics::incr(&self.shared.metrics.hits);
        trace!(key = %self.key, "serving fresh value");
        return Ok(value.clone());
      }
    }

    // A value with nothing to dispose stays in place until it is replaced,
    // so a failed or cancelled refetch still leaves it readable.
    if self.disposes_values() {
      self.dispose_current(EvictionReason::Expired).await;
    }

    Metrics::incr(&self.shared.metrics.fetches);
    debug!(key = %self.key, "fetching value");

    let fetched = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(CacheError::Cancelled),
      _ = self.lifecycle.cancelled() => return Err(CacheError::Cancelled),
      result = (self.fetcher)(cancel.clone()) => result,
    };

    match fetched {
      Ok(value) => {
        let superseded = {
          let mut slot = self.slot.lock();
          slot.fetched_at = Some(Instant::now());
          slot.value.replace(value.clone())
        };
        if superseded.is_some() {
          self.shared.notify_evict(&self.key, EvictionReason::Expired);
        }
        Ok(value)
      }
      Err(source) => {
        Metrics::incr(&self.shared.metrics.fetch_failures);
        Err(CacheError::Fetch {
          key: self.key.clone(),
          source,
        })
      }
    }
  }

  /// Disposes the entry: stops background refresh, then waits for any
  /// in-flight fetch and disposes the current value if the policy allows.
  /// Safe to call more than once; the value is disposed at most once.
  pub(crate) async fn dispose(&self, reason: EvictionReason) {
    self.lifecycle.cancel();
    let _guard = self.fetch_lock.lock().await;
    self.dispose_current(reason).await;
  }

  /// Stops background refresh without running any disposal contract.
  pub(crate) fn cancel(&self) {
    self.lifecycle.cancel();
  }

  pub(crate) fn disarm_refresh(&self) {
    self.refresh_armed.store(false, Ordering::Release);
  }

  fn arm_refresh(self: &Arc<Self>) {
    let Some(limit) = self.policy.active_refresh_limit() else {
      return;
    };
    if self.lifecycle.is_cancelled() {
      return;
    }
    if self
      .refresh_armed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return;
    }

    debug!(key = %self.key, limit, period = ?self.policy.lifetime, "arming background refresh");
    let task = refresh::run(
      Arc::downgrade(self),
      self.lifecycle.clone(),
      self.policy.lifetime,
      limit,
    );
    self.shared.spawner.spawn(Box::pin(task));
  }

  /// Takes the value out of the entry, leaving it empty and expired, and
  /// runs the disposal contract if allowed. Must be called with the entry
  /// lock held.
  async fn dispose_current(&self, reason: EvictionReason) {
    let value = {
      let mut slot = self.slot.lock();
      slot.fetched_at = None;
      slot.value.take()
    };
    let Some(value) = value else {
      return;
    };

    self.shared.notify_evict(&self.key, reason);

    if !self.policy.allow_dispose {
      return;
    }
    let Some(disposer) = &self.disposer else {
      return;
    };

    debug!(key = %self.key, %reason, "disposing value");
    match disposer(value).await {
      Ok(()) => Metrics::incr(&self.shared.metrics.disposals),
      Err(err) => {
        Metrics::incr(&self.shared.metrics.dispose_failures);
        warn!(key = %self.key, %reason, error = %err, "failed to dispose cached value");
        self.shared.notify_dispose_error(&self.key, &err);
      }
    }
  }
}
