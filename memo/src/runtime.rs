use std::{future::Future, pin::Pin};

/// A trait for spawning a future onto an asynchronous runtime.
///
/// Background refresh tasks are spawned through this seam.
pub trait TaskSpawner: Send + Sync + 'static {
  /// Spawns a type-erased future.
  fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// Spawns onto Tokio, either the runtime of the calling task or a captured
/// runtime handle.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner(Option<tokio::runtime::Handle>);

impl TokioSpawner {
  /// Creates a spawner that uses whichever Tokio runtime is current when a
  /// task is spawned.
  pub fn new() -> Self {
    Self(None)
  }

  /// Creates a spawner bound to a specific runtime.
  pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
    Self(Some(handle))
  }
}

impl TaskSpawner for TokioSpawner {
  fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>) {
    match &self.0 {
      Some(handle) => {
        handle.spawn(future);
      }
      None => {
        tokio::spawn(future);
      }
    }
  }
}
