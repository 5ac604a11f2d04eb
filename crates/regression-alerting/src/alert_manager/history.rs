//! Bounded alert history and the statistics derived from it

use super::types::{AlertHistoryEntry, AlertStats};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Default ring buffer capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Ring buffer of dispatched alerts, oldest evicted first
#[derive(Debug)]
pub struct AlertHistory {
    entries: VecDeque<AlertHistoryEntry>,
    capacity: usize,
}

impl Default for AlertHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl AlertHistory {
    /// Empty history holding at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entry once over capacity
    pub fn push(&mut self, entry: AlertHistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &AlertHistoryEntry> {
        self.entries.iter()
    }

    /// Totals, recent counts and group-by tallies relative to `now`
    pub fn stats(&self, now: DateTime<Utc>) -> AlertStats {
        let day_ago = now - Duration::hours(24);
        let week_ago = now - Duration::days(7);

        let mut stats = AlertStats {
            total: self.entries.len(),
            ..AlertStats::default()
        };

        for entry in &self.entries {
            if entry.timestamp > day_ago {
                stats.last_24_hours += 1;
            }
            if entry.timestamp > week_ago {
                stats.last_7_days += 1;
            }
            *stats.by_type.entry(entry.alert_type.clone()).or_insert(0) += 1;
            *stats.by_severity.entry(entry.severity).or_insert(0) += 1;
            *stats
                .by_environment
                .entry(entry.environment.clone())
                .or_insert(0) += 1;
        }

        stats
    }
}
