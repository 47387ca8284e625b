//! Running monitor statistics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::{MonitorEvent, MonitorEventKind};
use crate::analyzer::Language;
use crate::bounded::BoundedLog;

/// Entries kept in the recent-activity log.
pub const RECENT_ACTIVITY_CAPACITY: usize = 100;

/// One line of recent activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: MonitorEventKind,
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub timestamp: i64,
    pub size: Option<u64>,
}

impl From<&MonitorEvent> for ActivityEntry {
    fn from(event: &MonitorEvent) -> Self {
        Self {
            kind: event.kind,
            path: event.path.clone(),
            relative_path: event.relative_path.clone(),
            timestamp: event.timestamp,
            size: event.size,
        }
    }
}

/// Snapshot of monitor statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Paths with a cached (non-deleted) entry.
    pub total_files: usize,
    /// Sum of the sizes of tracked files.
    pub total_size: u64,
    /// Tracked files per language.
    pub languages: BTreeMap<Language, usize>,
    /// Most recent events, newest first.
    pub recent_activity: Vec<ActivityEntry>,
    /// Analysis failures.
    pub error_count: u64,
    /// Subscriber handlers that failed or panicked.
    pub subscriber_failures: u64,
    /// Events emitted since start.
    pub events_processed: u64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Mutable statistics, guarded by the monitor.
#[derive(Debug)]
pub(super) struct StatsState {
    pub total_size: u64,
    pub languages: BTreeMap<Language, usize>,
    pub recent: BoundedLog<ActivityEntry>,
    pub error_count: u64,
    pub subscriber_failures: u64,
    pub events_processed: u64,
    pub last_update: Option<i64>,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            total_size: 0,
            languages: BTreeMap::new(),
            recent: BoundedLog::new(RECENT_ACTIVITY_CAPACITY),
            error_count: 0,
            subscriber_failures: 0,
            events_processed: 0,
            last_update: None,
        }
    }
}

impl StatsState {
    /// Account for a newly tracked file.
    pub fn track(&mut self, language: Language, size: u64) {
        self.total_size = self.total_size.saturating_add(size);
        *self.languages.entry(language).or_insert(0) += 1;
    }

    /// Account for a file no longer tracked.
    pub fn untrack(&mut self, language: Language, size: u64) {
        self.total_size = self.total_size.saturating_sub(size);
        if let Some(count) = self.languages.get_mut(&language) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.languages.remove(&language);
            }
        }
    }

    /// Account for a size change of a tracked file.
    pub fn resize(&mut self, old: u64, new: u64) {
        self.total_size = self.total_size.saturating_sub(old).saturating_add(new);
    }

    pub fn record(&mut self, event: &MonitorEvent) {
        self.recent.push(ActivityEntry::from(event));
        self.events_processed += 1;
        self.last_update = Some(event.timestamp);
    }

    pub fn snapshot(&self, total_files: usize) -> MonitorStats {
        MonitorStats {
            total_files,
            total_size: self.total_size,
            languages: self.languages.clone(),
            recent_activity: self.recent.newest_first().cloned().collect(),
            error_count: self.error_count,
            subscriber_failures: self.subscriber_failures,
            events_processed: self.events_processed,
            last_update: self.last_update.map(crate::clock::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: MonitorEventKind, path: &str, timestamp: i64) -> MonitorEvent {
        MonitorEvent {
            kind,
            path: PathBuf::from(path),
            relative_path: PathBuf::from(path.trim_start_matches('/')),
            timestamp,
            size: None,
            analysis: None,
            previous_analysis: None,
            previous_path: None,
            message: None,
        }
    }

    #[test]
    fn test_track_and_untrack() {
        let mut stats = StatsState::default();
        stats.track(Language::Rust, 100);
        stats.track(Language::Rust, 50);
        stats.resize(50, 80);
        stats.untrack(Language::Rust, 100);

        let snapshot = stats.snapshot(1);
        assert_eq!(snapshot.total_size, 80);
        assert_eq!(snapshot.languages.get(&Language::Rust), Some(&1));

        stats.untrack(Language::Rust, 80);
        assert!(stats.snapshot(0).languages.is_empty());
    }

    #[test]
    fn test_recent_activity_is_bounded_and_newest_first() {
        let mut stats = StatsState::default();
        for i in 0..150 {
            stats.record(&event(MonitorEventKind::Modified, &format!("/f{i}.rs"), i));
        }
        let snapshot = stats.snapshot(0);
        assert_eq!(snapshot.recent_activity.len(), RECENT_ACTIVITY_CAPACITY);
        assert_eq!(snapshot.recent_activity[0].timestamp, 149);
        assert_eq!(snapshot.events_processed, 150);
        assert_eq!(
            snapshot.last_update.map(|t| t.timestamp_millis()),
            Some(149)
        );
    }
}
