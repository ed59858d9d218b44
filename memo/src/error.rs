use thiserror::Error;

/// A type-erased error returned by user fetch functions and disposal contracts.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
  /// The caller's cancellation token fired while waiting for a lock or
  /// awaiting the fetch. The entry is left as it was before the call.
  #[error("operation was cancelled")]
  Cancelled,

  /// The fetch function failed. The entry stays expired, so the next
  /// access retries.
  #[error("fetch failed for key '{key}'")]
  Fetch {
    key: String,
    #[source]
    source: BoxError,
  },

  /// The request carried a policy the cache cannot honor.
  #[error("invalid fetch policy")]
  InvalidPolicy(#[from] PolicyError),
}

impl CacheError {
  /// Returns `true` if this error is a cancellation.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, CacheError::Cancelled)
  }
}

/// Errors raised when validating a `FetchPolicy`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
  /// Background refresh runs once per lifetime, so a zero lifetime would spin.
  #[error("refresh limit {refresh_limit} requires a non-zero lifetime")]
  ZeroLifetimeRefresh { refresh_limit: u32 },
}
