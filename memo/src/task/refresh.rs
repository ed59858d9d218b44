use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::metrics::Metrics;

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The background refresh loop for one entry.
///
/// Each firing is scheduled for the moment the current value expires, one
/// `period` after it was fetched, and runs the entry's expiry-checked fetch
/// under the entry's lifecycle token. Consecutive refresh fetches therefore
/// start `period` plus the previous fetch's duration apart. The loop exits
/// after `limit` successful firings, on the first failure, when the entry
/// is disposed, or when the entry has been dropped.
pub(crate) async fn run(entry: Weak<CacheEntry>, lifecycle: CancellationToken, period: Duration, limit: u32) {
  let mut completed = 0u32;

  loop {
    // Only hold the entry while reading its deadline or firing; an idle
    // loop must not keep it alive.
    let deadline = match entry.upgrade() {
      Some(entry) => entry.expires_at(),
      None => return,
    };

    tokio::select! {
      biased;
      _ = lifecycle.cancelled() => return,
      _ = wait_for(deadline, period) => {}
    }

    let Some(entry) = entry.upgrade() else {
      return;
    };

    // A caller refetched while we slept; follow the new deadline.
    if entry.expires_at().is_some_and(|at| at > Instant::now()) {
      continue;
    }

    match entry.fetch_if_expired(&lifecycle).await {
      Ok(_) => {
        completed += 1;
        Metrics::incr(&entry.shared.metrics.refreshes);
        if completed >= limit {
          debug!(key = %entry.key(), completed, "refresh limit reached, disarming");
          entry.disarm_refresh();
          return;
        }
      }
      // Disposed mid-flight.
      Err(CacheError::Cancelled) => return,
      Err(err) => {
        Metrics::incr(&entry.shared.metrics.refresh_failures);
        warn!(key = %entry.key(), error = ?err, "background refresh failed, disarming");
        entry.shared.notify_refresh_error(entry.key(), &err);
        entry.disarm_refresh();
        return;
      }
    }
  }
}

async fn wait_for(deadline: Option<Instant>, period: Duration) {
  match deadline {
    Some(at) => sleep_until(at).await,
    None => sleep(period).await,
  }
}
