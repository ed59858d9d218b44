use crate::error::BoxError;

use futures_util::future::BoxFuture;

/// A synchronous disposal contract for cached values.
///
/// Register it on a request with [`FetchRequest::disposable`]. The cache
/// calls `dispose` at most once per fetched value: when the value is
/// superseded by a re-fetch, when its entry is removed, or when the cache
/// is closed.
///
/// [`FetchRequest::disposable`]: crate::FetchRequest::disposable
pub trait Dispose: Send + Sync + 'static {
  fn dispose(&self) -> Result<(), BoxError>;
}

/// An asynchronous disposal contract for cached values.
///
/// Register it on a request with [`FetchRequest::async_disposable`].
///
/// [`FetchRequest::async_disposable`]: crate::FetchRequest::async_disposable
pub trait AsyncDispose: Send + Sync + 'static {
  fn dispose_async(&self) -> BoxFuture<'_, Result<(), BoxError>>;
}
