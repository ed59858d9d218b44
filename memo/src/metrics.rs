use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the cache.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub struct Metrics {
  // --- Lookups ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) fetches: CachePadded<AtomicU64>,
  pub(crate) fetch_failures: CachePadded<AtomicU64>,

  // --- Background refresh ---
  pub(crate) refreshes: CachePadded<AtomicU64>,
  pub(crate) refresh_failures: CachePadded<AtomicU64>,

  // --- Eviction / disposal ---
  pub(crate) removals: CachePadded<AtomicU64>,
  pub(crate) disposals: CachePadded<AtomicU64>,
  pub(crate) dispose_failures: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      fetches: CachePadded::new(AtomicU64::new(0)),
      fetch_failures: CachePadded::new(AtomicU64::new(0)),
      refreshes: CachePadded::new(AtomicU64::new(0)),
      refresh_failures: CachePadded::new(AtomicU64::new(0)),
      removals: CachePadded::new(AtomicU64::new(0)),
      disposals: CachePadded::new(AtomicU64::new(0)),
      dispose_failures: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let fetches = self.fetches.load(Ordering::Relaxed);
    let total_lookups = hits + fetches;

    MetricsSnapshot {
      hits,
      fetches,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
      refreshes: self.refreshes.load(Ordering::Relaxed),
      refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
      disposals: self.disposals.load(Ordering::Relaxed),
      dispose_failures: self.dispose_failures.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Accesses served from a fresh value without fetching.
  pub hits: u64,
  /// Fetch invocations, whether caller-driven or background refreshes.
  pub fetches: u64,
  /// The hit ratio (hits / (hits + fetches)).
  pub hit_ratio: f64,
  /// Fetch invocations that returned an error.
  pub fetch_failures: u64,
  /// Successful background refresh firings.
  pub refreshes: u64,
  /// Background refresh firings that failed and disarmed refresh.
  pub refresh_failures: u64,
  /// Entries removed through `remove`.
  pub removals: u64,
  /// Disposal contracts run to completion without error.
  pub disposals: u64,
  /// Disposal contracts that returned an error.
  pub dispose_failures: u64,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("fetches", &self.fetches)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("fetch_failures", &self.fetch_failures)
      .field("refreshes", &self.refreshes)
      .field("refresh_failures", &self.refresh_failures)
      .field("removals", &self.removals)
      .field("disposals", &self.disposals)
      .field("dispose_failures", &self.dispose_failures)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
