use crate::error::{BoxError, CacheError};
use crate::listener::{EntryListener, EvictionReason};
use crate::metrics::Metrics;
use crate::TaskSpawner;

use std::fmt;
use std::sync::Arc;

/// The parts of the cache every entry needs: metrics, the listener and the
/// spawner used for background refresh.
pub(crate) struct CacheShared {
  pub(crate) metrics: Metrics,
  pub(crate) listener: Option<Arc<dyn EntryListener>>,
  pub(crate) spawner: Arc<dyn TaskSpawner>,
}

impl fmt::Debug for CacheShared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("metrics", &self.metrics.snapshot())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

impl CacheShared {
  pub(crate) fn notify_evict(&self, key: &str, reason: EvictionReason) {
    if let Some(listener) = &self.listener {
      listener.on_evict(key, reason);
    }
  }

  pub(crate) fn notify_refresh_error(&self, key: &str, error: &CacheError) {
    if let Some(listener) = &self.listener {
      listener.on_refresh_error(key, error);
    }
  }

  pub(crate) fn notify_dispose_error(&self, key: &str, error: &BoxError) {
    if let Some(listener) = &self.listener {
      listener.on_dispose_error(key, error);
    }
  }
}
