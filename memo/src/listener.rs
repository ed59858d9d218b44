use crate::error::{BoxError, CacheError};

use std::fmt;

/// Describes why a cached value left its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The value expired and was superseded by a re-fetch.
  Expired,
  /// The entry was manually removed.
  Removed,
  /// The cache was closed.
  Closed,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Expired => write!(f, "superseded after expiration"),
      EvictionReason::Removed => write!(f, "manually removed"),
      EvictionReason::Closed => write!(f, "cache closed"),
    }
  }
}

/// Observer for events that have no caller to report to.
///
/// Background refresh failures and disposal failures are not returned from
/// any cache operation. Register a listener with
/// [`MemoCacheBuilder::listener`] to see them. Hooks run inline on the task
/// that triggered them, so they should return quickly.
///
/// [`MemoCacheBuilder::listener`]: crate::MemoCacheBuilder::listener
pub trait EntryListener: Send + Sync {
  /// Called after a value has been taken out of its entry, before its
  /// disposal contract runs.
  fn on_evict(&self, _key: &str, _reason: EvictionReason) {}

  /// Called when a background refresh fetch fails. Background refresh for
  /// the entry is disarmed afterwards.
  fn on_refresh_error(&self, _key: &str, _error: &CacheError) {}

  /// Called when a value's disposal contract returns an error.
  fn on_dispose_error(&self, _key: &str, _error: &BoxError) {}
}
