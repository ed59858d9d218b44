use crate::dispose::{AsyncDispose, Dispose};
use crate::error::BoxError;

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use tokio_util::sync::CancellationToken;

/// A cached value with its concrete type erased. Callers recover the type
/// with `Arc::downcast`.
pub(crate) type CachedValue = Arc<dyn Any + Send + Sync>;

pub(crate) type FetchFuture = Pin<Box<dyn Future<Output = Result<CachedValue, BoxError>> + Send>>;

/// The user's fetch function, boxed so that entries of any value type can
/// live in the same store.
pub(crate) type Fetcher = Arc<dyn Fn(CancellationToken) -> FetchFuture + Send + Sync>;

/// Runs the disposal contract of a type-erased value.
pub(crate) type Disposer = Arc<dyn Fn(CachedValue) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

pub(crate) fn fetcher<T, F, Fut, E>(fetch: F) -> Fetcher
where
  T: Send + Sync + 'static,
  F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, E>> + Send + 'static,
  E: Into<BoxError> + 'static,
{
  Arc::new(move |cancel: CancellationToken| -> FetchFuture {
    let pending = fetch(cancel);
    Box::pin(async move {
      match pending.await {
        Ok(value) => Ok(Arc::new(value) as CachedValue),
        Err(err) => Err(err.into()),
      }
    })
  })
}

pub(crate) fn sync_disposer<T: Dispose>() -> Disposer {
  Arc::new(|value: CachedValue| -> BoxFuture<'static, Result<(), BoxError>> {
    let result = match value.downcast::<T>() {
      Ok(value) => value.dispose(),
      Err(_) => Ok(()),
    };
    Box::pin(future::ready(result))
  })
}

pub(crate) fn async_disposer<T: AsyncDispose>() -> Disposer {
  Arc::new(|value: CachedValue| -> BoxFuture<'static, Result<(), BoxError>> {
    Box::pin(async move {
      match value.downcast::<T>() {
        Ok(value) => value.dispose_async().await,
        Err(_) => Ok(()),
      }
    })
  })
}
