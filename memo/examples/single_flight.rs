use fibre_memo::{BoxError, CancellationToken, FetchRequest, MemoCache};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tokio::time::{sleep, Duration};

// A simulated database or slow external service.
async fn fetch_from_database(key: &'static str, load_count: Arc<AtomicUsize>) -> Result<String, BoxError> {
  println!("--- Database: Received request for '{}'. Simulating slow query...", key);
  load_count.fetch_add(1, Ordering::SeqCst);
  sleep(Duration::from_millis(500)).await;
  Ok(format!("value_for_{}", key))
}

fn request(load_count: &Arc<AtomicUsize>) -> FetchRequest<String> {
  let load_count = load_count.clone();
  FetchRequest::new("answer", Duration::from_secs(30), move |_cancel| {
    fetch_from_database("answer", load_count.clone())
  })
}

#[tokio::main]
async fn main() {
  let load_counter = Arc::new(AtomicUsize::new(0));
  let cache = Arc::new(MemoCache::new());

  println!("--- Single-flight Demonstration ---");
  println!("Spawning 10 tasks to request the same key at once.\n");

  let mut tasks = Vec::new();
  for i in 0..10 {
    let cache = cache.clone();
    let request = request(&load_counter);
    tasks.push(tokio::spawn(async move {
      let value = cache
        .get_or_add(request, &CancellationToken::new())
        .await
        .expect("fetch failed");
      println!("[Task {}] Received value: {:?}", i, value);
    }));
  }

  for task in tasks {
    task.await.unwrap();
  }

  println!(
    "\nDatabase function was called {} time(s).",
    load_counter.load(Ordering::SeqCst)
  );
  assert_eq!(load_counter.load(Ordering::SeqCst), 1);

  cache.close().await;
  println!("\nCache metrics: {:#?}", cache.metrics());
}
