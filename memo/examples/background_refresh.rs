use fibre_memo::{AsyncDispose, BoxError, CacheError, CancellationToken, EntryListener, EvictionReason, FetchRequest, MemoCache};
use futures_util::future::BoxFuture;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tokio::time::{sleep, Duration};
use tracing_subscriber::EnvFilter;

/// A pretend connection that must be closed when it is replaced.
struct Connection {
  generation: usize,
}

impl AsyncDispose for Connection {
  fn dispose_async(&self) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async move {
      println!("--- Closing connection generation {}", self.generation);
      Ok(())
    })
  }
}

struct PrintListener;

impl EntryListener for PrintListener {
  fn on_evict(&self, key: &str, reason: EvictionReason) {
    println!("[Listener] '{}' evicted: {}", key, reason);
  }

  fn on_refresh_error(&self, key: &str, error: &CacheError) {
    println!("[Listener] refresh of '{}' failed: {}", key, error);
  }
}

#[tokio::main]
async fn main() -> Result<(), CacheError> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fibre_memo=debug")))
    .init();

  let cache = MemoCache::builder().listener(PrintListener).build();
  let cancel = CancellationToken::new();
  let generations = Arc::new(AtomicUsize::new(0));

  let request = {
    let generations = generations.clone();
    FetchRequest::new("primary-db", Duration::from_millis(200), move |_cancel| {
      let generation = generations.fetch_add(1, Ordering::SeqCst) + 1;
      async move {
        println!("--- Opening connection generation {}", generation);
        Ok::<_, BoxError>(Connection { generation })
      }
    })
    .async_disposable()
    .refresh_limit(3)
  };

  let conn = cache.get_or_add(request, &cancel).await?;
  println!("Got generation {:?}", conn.map(|c| c.generation));

  // Three background refreshes happen, then refresh disarms.
  sleep(Duration::from_secs(1)).await;
  let conn = cache.get::<Connection>("primary-db", &cancel).await?;
  println!("After idling: generation {:?}", conn.map(|c| c.generation));

  cache.close().await;
  println!("\nCache metrics: {:#?}", cache.metrics());
  Ok(())
}
