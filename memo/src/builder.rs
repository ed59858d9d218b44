use crate::listener::EntryListener;
use crate::metrics::Metrics;
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::shared::CacheShared;
use crate::MemoCache;

use core::fmt;
use std::sync::Arc;

/// A builder for creating `MemoCache` instances.
///
/// Expiration, disposal and refresh are configured per request through
/// [`FetchPolicy`](crate::FetchPolicy); the builder only covers what is
/// shared by every entry.
#[derive(Default)]
pub struct MemoCacheBuilder {
  listener: Option<Arc<dyn EntryListener>>,
  spawner: Option<Arc<dyn TaskSpawner>>,
}

impl fmt::Debug for MemoCacheBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoCacheBuilder")
      .field("has_listener", &self.listener.is_some())
      .field("has_spawner", &self.spawner.is_some())
      .finish()
  }
}

impl MemoCacheBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the listener notified of evictions, background refresh failures
  /// and disposal failures.
  pub fn listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EntryListener + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets the spawner used for background refresh tasks.
  ///
  /// Defaults to [`TokioSpawner::new`], which spawns onto the runtime of
  /// the task that arms the refresh.
  pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
    self.spawner = Some(spawner);
    self
  }

  pub fn build(self) -> MemoCache {
    let spawner = self
      .spawner
      .unwrap_or_else(|| Arc::new(TokioSpawner::new()));

    MemoCache::from_shared(CacheShared {
      metrics: Metrics::new(),
      listener: self.listener,
      spawner,
    })
  }
}
