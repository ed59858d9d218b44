//! An async memoization cache for expensive, caller-supplied fetches.
//!
//! # Features
//! - **Single-flight**: at most one fetch runs per key at a time; concurrent
//!   callers for the same key share its result.
//! - **Lifetimes**: each value expires `lifetime` after it was fetched and
//!   is refetched lazily on the next access.
//! - **Background refresh**: an optional, bounded number of automatic
//!   refetches, one per lifetime, that stop on the first failure.
//! - **Disposal**: values implementing [`Dispose`] or [`AsyncDispose`] are
//!   disposed exactly once when superseded, removed, or when the cache is
//!   closed.
//! - **Cancellation**: every operation takes a [`CancellationToken`] that
//!   aborts its lock wait and fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use fibre_memo::{CancellationToken, FetchRequest, MemoCache};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), fibre_memo::CacheError> {
//! let cache = MemoCache::new();
//! let cancel = CancellationToken::new();
//!
//! let request = FetchRequest::new("greeting", Duration::from_secs(30), |_cancel| async {
//!   Ok::<_, std::io::Error>(String::from("hello"))
//! })
//! .refresh_limit(3);
//!
//! let greeting = cache.get_or_add(request, &cancel).await?;
//! assert_eq!(greeting.as_deref().map(String::as_str), Some("hello"));
//!
//! cache.close().await;
//! # Ok(())
//! # }
//! ```

// Public modules that form the API
pub mod builder;
pub mod dispose;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod request;
pub mod runtime;

// Internal, crate-only modules
mod entry;
mod loader;
mod shared;
mod store;
mod sync;
mod task;

// Re-export the primary user-facing types for convenience
pub use builder::MemoCacheBuilder;
pub use dispose::{AsyncDispose, Dispose};
pub use error::{BoxError, CacheError, PolicyError};
pub use listener::{EntryListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use policy::FetchPolicy;
pub use request::FetchRequest;
pub use runtime::{TaskSpawner, TokioSpawner};
pub use store::MemoCache;

pub use tokio_util::sync::CancellationToken;
