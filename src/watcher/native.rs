//! Native file-system notifications using notify-rs.

use std::path::PathBuf;
use std::sync::Weak;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};

use super::monitor::DirectoryMonitor;
use crate::error::MonitorError;
use crate::Result;

/// Debounced recursive watches over the monitor's roots.
///
/// Dropping the watcher releases every watch.
pub(super) struct NativeWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    watched: Vec<PathBuf>,
}

impl std::fmt::Debug for NativeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWatcher")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

impl NativeWatcher {
    /// Watch `roots` and forward changes to the monitor.
    ///
    /// The callback holds a weak reference so the debouncer thread never keeps
    /// the monitor alive. Roots that cannot be watched are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created.
    pub fn start(
        monitor: Weak<DirectoryMonitor>,
        roots: &[PathBuf],
        debounce: Duration,
    ) -> Result<Self> {
        let mut debouncer = new_debouncer(
            debounce,
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let Some(monitor) = monitor.upgrade() else {
                        return;
                    };
                    for event in events {
                        if matches!(
                            event.kind,
                            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                        ) {
                            monitor.handle_native_change(&event.path);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
        )
        .map_err(|e| MonitorError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        let mut watched = Vec::new();
        for root in roots {
            if !root.exists() {
                tracing::warn!(path = %root.display(), "Root does not exist, not watching");
                continue;
            }
            match debouncer.watcher().watch(root, RecursiveMode::Recursive) {
                Ok(()) => {
                    tracing::info!(path = %root.display(), "Watching directory");
                    watched.push(root.clone());
                }
                Err(e) => {
                    let err = MonitorError::WatchFailed {
                        path: root.display().to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %err, "Skipping root");
                }
            }
        }

        Ok(Self {
            _debouncer: debouncer,
            watched,
        })
    }

    /// Roots with an active watch.
    #[must_use]
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_roots_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![tmp.path().to_path_buf(), tmp.path().join("missing")];
        let watcher =
            NativeWatcher::start(Weak::new(), &roots, Duration::from_millis(50)).unwrap();
        assert_eq!(watcher.watched(), &[tmp.path().to_path_buf()]);
    }
}
