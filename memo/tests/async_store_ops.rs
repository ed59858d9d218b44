mod common;

use common::counting_request;
use fibre_memo::{BoxError, CacheError, CancellationToken, FetchRequest, MemoCache};
use std::collections::HashSet;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tokio::time::{sleep, Duration};

#[tokio::test]
async fn test_unknown_key_is_absent() {
  let cache = MemoCache::new();
  let cancel = CancellationToken::new();

  assert!(cache.get::<usize>("missing", &cancel).await.unwrap().is_none());
  assert!(!cache.keys(&cancel).await.unwrap().contains("missing"));
  assert!(!cache.remove("missing", &cancel).await.unwrap());
  assert_eq!(cache.len(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_keys_and_remove() {
  let cache = MemoCache::new();
  let cancel = CancellationToken::new();
  let calls = Arc::new(AtomicUsize::new(0));

  for key in ["a", "b", "c"] {
    cache
      .get_or_add(counting_request(key, Duration::from_secs(60), &calls), &cancel)
      .await
      .unwrap();
  }

  let expected: HashSet<String> = ["a", "b", "c"].iter().map(|k| k.to_string()).collect();
  assert_eq!(cache.keys(&cancel).await.unwrap(), expected);

  assert!(cache.remove("b", &cancel).await.unwrap());
  assert!(cache.get::<usize>("b", &cancel).await.unwrap().is_none());
  assert!(!cache.contains_key("b", &cancel).await.unwrap());
  assert_eq!(cache.len(&cancel).await.unwrap(), 2);

  // A fresh entry is created after removal and fetches again.
  let value = cache
    .get_or_add(counting_request("b", Duration::from_secs(60), &calls), &cancel)
    .await
    .unwrap();
  assert_eq!(value.as_deref(), Some(&4));
}

#[tokio::test(start_paused = true)]
async fn test_get_does_not_fetch_or_expire() {
  let cache = MemoCache::new();
  let cancel = CancellationToken::new();
  let calls = Arc::new(AtomicUsize::new(0));

  cache
    .get_or_add(counting_request("k", Duration::from_millis(10), &calls), &cancel)
    .await
    .unwrap();
  sleep(Duration::from_millis(50)).await;

  assert_eq!(cache.get::<usize>("k", &cancel).await.unwrap().as_deref(), Some(&1));
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_token_fails_fast() {
  let cache = MemoCache::new();
  let cancel = CancellationToken::new();
  cancel.cancel();
  let calls = Arc::new(AtomicUsize::new(0));

  let err = cache
    .get_or_add(counting_request("k", Duration::from_secs(60), &calls), &cancel)
    .await
    .unwrap_err();
  assert!(err.is_cancelled());
  assert!(matches!(cache.keys(&cancel).await, Err(CacheError::Cancelled)));
  assert_eq!(calls.load(Ordering::SeqCst), 0);

  let live = CancellationToken::new();
  assert!(!cache.contains_key("k", &live).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_refetch_leaves_entry_untouched() {
  let cache = MemoCache::new();
  let calls = Arc::new(AtomicUsize::new(0));

  // Only the first fetch is fast.
  let request = || {
    let calls = calls.clone();
    FetchRequest::new("slow", Duration::from_millis(100), move |_cancel| {
      let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
      async move {
        if attempt > 1 {
          sleep(Duration::from_secs(10)).await;
        }
        Ok::<_, BoxError>(attempt)
      }
    })
  };

  let live = CancellationToken::new();
  cache.get_or_add(request(), &live).await.unwrap();
  sleep(Duration::from_millis(150)).await;

  // 1. Cancel the refetch halfway through.
  let cancel = CancellationToken::new();
  let canceller = {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      sleep(Duration::from_millis(50)).await;
      cancel.cancel();
    })
  };

  let err = cache.get_or_add(request(), &cancel).await.unwrap_err();
  assert!(err.is_cancelled());
  canceller.await.unwrap();

  // 2. The stale value was neither replaced nor dropped.
  assert_eq!(cache.get::<usize>("slow", &live).await.unwrap().as_deref(), Some(&1));

  // 3. It is still expired, so the next caller fetches again.
  let value = cache.get_or_add(request(), &live).await.unwrap();
  assert_eq!(value.as_deref(), Some(&3));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting_for_store_lock() {
  let cache = Arc::new(MemoCache::new());

  // 1. Hold the store lock with a slow fetch.
  let holder = {
    let cache = cache.clone();
    tokio::spawn(async move {
      let request = FetchRequest::new("slow", Duration::from_secs(60), |_cancel| async {
        sleep(Duration::from_secs(1)).await;
        Ok::<_, BoxError>(1usize)
      });
      cache.get_or_add(request, &CancellationToken::new()).await
    })
  };
  sleep(Duration::from_millis(10)).await;

  // 2. A waiter with a cancelled token gives up while the lock is held.
  let cancel = CancellationToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      sleep(Duration::from_millis(10)).await;
      cancel.cancel();
    });
  }
  let err = cache.get::<usize>("slow", &cancel).await.unwrap_err();
  assert!(err.is_cancelled());
  assert!(!holder.is_finished());

  // 3. The holder is unaffected.
  let value = holder.await.unwrap().unwrap();
  assert_eq!(value.as_deref(), Some(&1));
}
