use crate::dispose::{AsyncDispose, Dispose};
use crate::error::BoxError;
use crate::loader::{self, Disposer, Fetcher};
use crate::policy::FetchPolicy;

use core::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Describes how to produce and keep the value for one key.
///
/// The request is consumed by [`MemoCache::get_or_add`]. It only takes
/// effect when it creates the entry for its key: once an entry exists, later
/// requests for the same key are served by the fetch function and policy the
/// entry was created with.
///
/// The fetch function receives a [`CancellationToken`]. On a caller-driven
/// fetch it is the caller's token; on a background refresh it is the
/// entry's own lifecycle token, cancelled when the entry is disposed.
///
/// [`MemoCache::get_or_add`]: crate::MemoCache::get_or_add
pub struct FetchRequest<T> {
  pub(crate) key: String,
  pub(crate) policy: FetchPolicy,
  pub(crate) fetcher: Fetcher,
  pub(crate) disposer: Option<Disposer>,
  _value_marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for FetchRequest<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FetchRequest")
      .field("key", &self.key)
      .field("policy", &self.policy)
      .field("has_disposer", &self.disposer.is_some())
      .finish_non_exhaustive()
  }
}

impl<T: Send + Sync + 'static> FetchRequest<T> {
  /// Creates a request with the given lifetime, no disposal and no
  /// background refresh.
  pub fn new<F, Fut, E>(key: impl Into<String>, lifetime: Duration, fetch: F) -> Self
  where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
  {
    Self::with_policy(key, FetchPolicy::new(lifetime), fetch)
  }

  /// Creates a request from a preconfigured policy.
  pub fn with_policy<F, Fut, E>(key: impl Into<String>, policy: FetchPolicy, fetch: F) -> Self
  where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
  {
    Self {
      key: key.into(),
      policy,
      fetcher: loader::fetcher(fetch),
      disposer: None,
      _value_marker: PhantomData,
    }
  }

  /// Sets whether superseded or evicted values have their disposal
  /// contract run.
  pub fn allow_dispose(mut self, allow_dispose: bool) -> Self {
    self.policy.allow_dispose = allow_dispose;
    self
  }

  /// Enables background refresh: after each successful access that finds
  /// refresh disarmed, the value is refetched each time it expires, at most
  /// `limit` times. Each refresh starts `lifetime` after the previous fetch
  /// finished, so a slow fetch stretches the interval. A limit of `0`
  /// disables refresh.
  pub fn refresh_limit(mut self, limit: u32) -> Self {
    self.policy.refresh_limit = Some(limit);
    self
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn policy(&self) -> &FetchPolicy {
    &self.policy
  }
}

impl<T: Dispose> FetchRequest<T> {
  /// Registers `T`'s synchronous disposal contract and enables disposal.
  pub fn disposable(mut self) -> Self {
    self.disposer = Some(loader::sync_disposer::<T>());
    self.policy.allow_dispose = true;
    self
  }
}

impl<T: AsyncDispose> FetchRequest<T> {
  /// Registers `T`'s asynchronous disposal contract and enables disposal.
  pub fn async_disposable(mut self) -> Self {
    self.disposer = Some(loader::async_disposer::<T>());
    self.policy.allow_dispose = true;
    self
  }
}
