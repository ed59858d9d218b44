use crate::error::CacheError;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Acquires `mutex` without blocking the thread, giving up with
/// `CacheError::Cancelled` if any of `tokens` fires first.
///
/// Tokio's mutex queues waiters in FIFO order, so acquisition follows
/// arrival order among the tasks still waiting.
pub(crate) async fn lock_or_cancel<'a, T>(
  mutex: &'a Mutex<T>,
  cancel: &CancellationToken,
  lifecycle: Option<&CancellationToken>,
) -> Result<MutexGuard<'a, T>, CacheError> {
  if cancel.is_cancelled() || lifecycle.is_some_and(CancellationToken::is_cancelled) {
    return Err(CacheError::Cancelled);
  }

  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(CacheError::Cancelled),
    _ = cancelled(lifecycle) => Err(CacheError::Cancelled),
    guard = mutex.lock() => Ok(guard),
  }
}

/// Resolves when `token` is cancelled, or never if there is no token.
pub(crate) async fn cancelled(token: Option<&CancellationToken>) {
  match token {
    Some(token) => token.cancelled().await,
    None => std::future::pending().await,
  }
}
