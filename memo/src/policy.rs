use crate::error::PolicyError;

use std::time::Duration;

/// The plain-data half of a fetch request: how long a value stays fresh,
/// whether it may be disposed on eviction, and how many background
/// refreshes it gets.
///
/// With the `serde` feature enabled the policy can be read from
/// configuration. `lifetime` is written as a human-readable duration:
///
/// ```json
/// { "lifetime": "250ms", "allow_dispose": true, "refresh_limit": 3 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchPolicy {
  /// How long a fetched value is considered fresh.
  #[cfg_attr(feature = "serde", serde(with = "humantime_duration"))]
  pub lifetime: Duration,
  /// Whether an evicted or superseded value has its disposal contract run.
  #[cfg_attr(feature = "serde", serde(default))]
  pub allow_dispose: bool,
  /// Maximum number of automatic background refreshes. `None` or `0`
  /// disables background refresh.
  #[cfg_attr(feature = "serde", serde(default))]
  pub refresh_limit: Option<u32>,
}

impl FetchPolicy {
  /// Creates a policy with the given lifetime, no disposal and no refresh.
  pub fn new(lifetime: Duration) -> Self {
    Self {
      lifetime,
      allow_dispose: false,
      refresh_limit: None,
    }
  }

  pub fn with_allow_dispose(mut self, allow_dispose: bool) -> Self {
    self.allow_dispose = allow_dispose;
    self
  }

  pub fn with_refresh_limit(mut self, refresh_limit: u32) -> Self {
    self.refresh_limit = Some(refresh_limit);
    self
  }

  /// Returns the refresh limit if background refresh is enabled.
  #[inline]
  pub(crate) fn active_refresh_limit(&self) -> Option<u32> {
    self.refresh_limit.filter(|limit| *limit > 0)
  }

  /// Checks that the policy can be honored.
  pub fn validate(&self) -> Result<(), PolicyError> {
    if let Some(refresh_limit) = self.active_refresh_limit() {
      if self.lifetime.is_zero() {
        return Err(PolicyError::ZeroLifetimeRefresh { refresh_limit });
      }
    }
    Ok(())
  }
}

#[cfg(feature = "serde")]
mod humantime_duration {
  use serde::{Deserialize, Deserializer, Serializer};
  use std::time::Duration;

  pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
  }
}
