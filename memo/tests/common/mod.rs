#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fibre_memo::{AsyncDispose, BoxError, CacheError, Dispose, EntryListener, EvictionReason, FetchRequest};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

/// Builds a request whose value is the number of times its fetch function
/// has been invoked, starting at 1.
pub fn counting_request(key: &str, lifetime: Duration, calls: &Arc<AtomicUsize>) -> FetchRequest<usize> {
  let calls = calls.clone();
  FetchRequest::new(key, lifetime, move |_cancel| {
    let calls = calls.clone();
    async move { Ok::<_, BoxError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
  })
}

/// A value that counts how many times it has been disposed.
#[derive(Debug)]
pub struct Probe {
  pub id: usize,
  pub disposed: Arc<AtomicUsize>,
  pub fail: bool,
}

impl Dispose for Probe {
  fn dispose(&self) -> Result<(), BoxError> {
    self.disposed.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      Err(format!("probe {} refused to close", self.id).into())
    } else {
      Ok(())
    }
  }
}

pub fn probe_request(key: &str, lifetime: Duration, calls: &Arc<AtomicUsize>, disposed: &Arc<AtomicUsize>) -> FetchRequest<Probe> {
  let calls = calls.clone();
  let disposed = disposed.clone();
  FetchRequest::new(key, lifetime, move |_cancel| {
    let id = calls.fetch_add(1, Ordering::SeqCst) + 1;
    let disposed = disposed.clone();
    async move {
      Ok::<_, BoxError>(Probe {
        id,
        disposed,
        fail: false,
      })
    }
  })
  .disposable()
}

/// The async counterpart of `Probe`.
#[derive(Debug)]
pub struct AsyncProbe {
  pub disposed: Arc<AtomicUsize>,
}

impl AsyncDispose for AsyncProbe {
  fn dispose_async(&self) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async move {
      tokio::task::yield_now().await;
      self.disposed.fetch_add(1, Ordering::SeqCst);
      Ok(())
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Evicted(String, EvictionReason),
  RefreshFailed(String),
  DisposeFailed(String, String),
}

/// Records every listener callback in order.
#[derive(Default, Clone)]
pub struct RecordingListener {
  pub events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingListener {
  pub fn events(&self) -> Vec<Event> {
    self.events.lock().clone()
  }
}

impl EntryListener for RecordingListener {
  fn on_evict(&self, key: &str, reason: EvictionReason) {
    self.events.lock().push(Event::Evicted(key.to_string(), reason));
  }

  fn on_refresh_error(&self, key: &str, error: &CacheError) {
    assert!(matches!(error, CacheError::Fetch { .. }));
    self.events.lock().push(Event::RefreshFailed(key.to_string()));
  }

  fn on_dispose_error(&self, key: &str, error: &BoxError) {
    self
      .events
      .lock()
      .push(Event::DisposeFailed(key.to_string(), error.to_string()));
  }
}
