//! Sliding-window rate limiting for alert dispatch
//!
//! Two gates share one map of timestamp lists: the global `"hourly"` key and
//! one `"{type}-{environment}"` key per alert kind for duplicate suppression.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

/// Key of the global hourly window
pub const HOURLY_KEY: &str = "hourly";

/// Retention of every window; also the longest usable duplicate window
pub const WINDOW_MINUTES: u64 = 60;

/// Why a dispatch was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Hourly cap reached
    HourlyCap,
    /// Same type and environment inside the suppression window
    Duplicate,
}

/// Rate-limit windows owned by one alert manager
#[derive(Debug, Default)]
pub struct RateLimitState {
    windows: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RateLimitState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate-suppression key for an alert kind
    pub fn duplicate_key(alert_type: &str, environment: &str) -> String {
        format!("{}-{}", alert_type, environment)
    }

    /// Drop timestamps older than [`WINDOW_MINUTES`] and empty windows
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::minutes(WINDOW_MINUTES as i64);
        self.windows.retain(|_, timestamps| {
            while timestamps.front().is_some_and(|ts| *ts <= cutoff) {
                timestamps.pop_front();
            }
            !timestamps.is_empty()
        });
    }

    /// Check both gates without recording anything
    pub fn check(
        &self,
        duplicate_key: &str,
        now: DateTime<Utc>,
        max_per_hour: usize,
        duplicate_window: Duration,
    ) -> Option<Suppression> {
        let hourly = self.windows.get(HOURLY_KEY).map_or(0, VecDeque::len);
        if hourly >= max_per_hour {
            return Some(Suppression::HourlyCap);
        }

        let recent_duplicate = self
            .windows
            .get(duplicate_key)
            .and_then(|timestamps| timestamps.back())
            .is_some_and(|last| now - *last < duplicate_window);
        if recent_duplicate {
            return Some(Suppression::Duplicate);
        }

        None
    }

    /// Record a non-suppressed dispatch in both windows
    pub fn record(&mut self, duplicate_key: &str, now: DateTime<Utc>) {
        for key in [HOURLY_KEY, duplicate_key] {
            self.windows
                .entry(key.to_string())
                .or_default()
                .push_back(now);
        }
    }

    /// Timestamps currently held for `key`
    pub fn count(&self, key: &str) -> usize {
        self.windows.get(key).map_or(0, VecDeque::len)
    }
}
