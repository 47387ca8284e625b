//! The directory monitor.
//!
//! Every file-system notification enters through
//! [`DirectoryMonitor::handle_file_system_event`]. The monitor filters the
//! path, reads and analyzes content, updates its per-path cache and running
//! statistics, and dispatches a [`MonitorEvent`] to subscribers.
//!
//! Events for the same path are serialized by a striped lock held from the
//! cache update through dispatch, so subscribers observe each path's events
//! in delivery order. Events for different paths proceed concurrently.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};

use super::events::{EventMeta, MonitorEvent, MonitorEventKind};
use super::filter::PathFilter;
use super::scanner;
use super::source::{ContentSource, FsContentSource};
use super::stats::{MonitorStats, StatsState};
use super::native::NativeWatcher;
use crate::analyzer::{FileAnalysis, FileAnalyzer, Language};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::observability::spans;
use crate::{clock, metrics, Result};

/// Number of per-path lock stripes.
const LOCK_STRIPES: usize = 64;

/// Handle returned by [`DirectoryMonitor::on`].
pub type SubscriberId = u64;

/// Receives monitor events.
///
/// Dispatch is synchronous. Errors and panics are caught, logged and counted;
/// they never reach other subscribers or the monitor.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber could not process the event.
    fn on_event(&self, event: &MonitorEvent) -> Result<()>;
}

impl<F> EventSubscriber for F
where
    F: Fn(&MonitorEvent) + Send + Sync,
{
    fn on_event(&self, event: &MonitorEvent) -> Result<()> {
        self(event);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    language: Language,
    size: u64,
    analysis: Option<Arc<FileAnalysis>>,
}

#[derive(Default)]
struct Lifecycle {
    running: bool,
    watcher: Option<NativeWatcher>,
}

/// Decrements the in-flight count when an accepted event finishes.
struct InFlightGuard<'a> {
    monitor: &'a DirectoryMonitor,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut count = self.monitor.in_flight.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.monitor.drained.notify_all();
        }
    }
}

/// Watches configured roots and turns changes into analyzed events.
pub struct DirectoryMonitor {
    config: Arc<MonitorConfig>,
    filter: PathFilter,
    analyzer: FileAnalyzer,
    source: Arc<dyn ContentSource>,
    lifecycle: Mutex<Lifecycle>,
    accepting: AtomicBool,
    in_flight: Mutex<usize>,
    drained: Condvar,
    stripes: Vec<Mutex<()>>,
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
    stats: Mutex<StatsState>,
    subscribers: RwLock<Vec<(SubscriberId, Arc<dyn EventSubscriber>)>>,
    next_subscriber: AtomicU64,
}

impl std::fmt::Debug for DirectoryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryMonitor")
            .field("roots", &self.config.roots)
            .field("running", &self.is_running())
            .field("tracked", &self.cache.read().len())
            .finish_non_exhaustive()
    }
}

impl DirectoryMonitor {
    /// Create a monitor that reads content from the local file system.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::with_source(config, Arc::new(FsContentSource))
    }

    /// Create a monitor that reads content through `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_source(config: MonitorConfig, source: Arc<dyn ContentSource>) -> Result<Self> {
        config.validate()?;
        let filter = PathFilter::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            filter,
            analyzer: FileAnalyzer::new(),
            source,
            lifecycle: Mutex::new(Lifecycle::default()),
            accepting: AtomicBool::new(false),
            in_flight: Mutex::new(0),
            drained: Condvar::new(),
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            cache: RwLock::new(HashMap::new()),
            stats: Mutex::new(StatsState::default()),
            subscribers: RwLock::new(Vec::new()),
            next_subscriber: AtomicU64::new(1),
        })
    }

    /// Monitor configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether the monitor has been started and not yet fully stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle.lock().running
    }

    /// Start accepting events.
    ///
    /// Registers native watches and runs the initial scan when configured.
    /// Watch failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if the monitor is running.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.running {
                return Err(MonitorError::AlreadyRunning.into());
            }
            lifecycle.running = true;
            {
                let _count = self.in_flight.lock();
                self.accepting.store(true, Ordering::SeqCst);
            }

            if self.config.native_watch {
                match NativeWatcher::start(
                    Arc::downgrade(self),
                    &self.config.roots,
                    self.config.debounce,
                ) {
                    Ok(watcher) => lifecycle.watcher = Some(watcher),
                    Err(e) => tracing::error!(error = %e, "Native watching unavailable"),
                }
            }
        }

        tracing::info!(
            roots = ?self.config.roots,
            native_watch = self.config.native_watch,
            initial_scan = self.config.initial_scan,
            "Directory monitor started"
        );

        if self.config.initial_scan {
            self.initial_scan();
        }

        Ok(())
    }

    /// Stop accepting events, wait for in-flight events, then release watches.
    ///
    /// Must not be called from inside a subscriber. Subscribers may still call
    /// [`is_running`](Self::is_running) while a stop drains. No-op when stopped.
    pub fn stop(&self) {
        {
            let lifecycle = self.lifecycle.lock();
            if !lifecycle.running {
                return;
            }
            let _count = self.in_flight.lock();
            self.accepting.store(false, Ordering::SeqCst);
        }

        {
            let mut count = self.in_flight.lock();
            while *count > 0 {
                self.drained.wait(&mut count);
            }
        }

        let watcher = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.running = false;
            lifecycle.watcher.take()
        };
        drop(watcher);
        tracing::info!("Directory monitor stopped");
    }

    /// Register a subscriber.
    pub fn on<S>(&self, subscriber: S) -> SubscriberId
    where
        S: EventSubscriber + 'static,
    {
        self.subscribe(Arc::new(subscriber))
    }

    /// Register a shared subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriberId {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, subscriber));
        tracing::debug!(subscriber = id, "Subscriber registered");
        id
    }

    /// Remove a subscriber. Returns false if the id is unknown.
    pub fn off(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Snapshot of running statistics.
    #[must_use]
    pub fn get_stats(&self) -> MonitorStats {
        let total_files = self.cache.read().len();
        self.stats.lock().snapshot(total_files)
    }

    /// Cached analysis of a path.
    #[must_use]
    pub fn cached_analysis(&self, path: &Path) -> Option<Arc<FileAnalysis>> {
        self.cache.read().get(path).and_then(|e| e.analysis.clone())
    }

    /// The single entry point for file-system notifications.
    ///
    /// Returns the emitted event, or `None` when the monitor is not running
    /// or the path is filtered out.
    pub fn handle_file_system_event(
        &self,
        kind: MonitorEventKind,
        path: &Path,
        meta: Option<EventMeta>,
    ) -> Option<MonitorEvent> {
        let _guard = self.enter()?;
        let span = spans::event_span(kind.as_str(), path);
        let _entered = span.enter();
        let meta = meta.unwrap_or_default();

        let skip_extension = kind.is_dir()
            || matches!(
                kind,
                MonitorEventKind::AnalysisComplete | MonitorEventKind::Error
            );
        if !self.filter.accepts(path, skip_extension) {
            // A file renamed to a filtered path is gone from the monitor's view.
            if let (MonitorEventKind::Renamed, Some(from)) = (kind, meta.from.as_deref()) {
                if self.cache.read().contains_key(from) {
                    let _lock = self.stripe(from).lock();
                    return Some(self.apply(MonitorEventKind::Deleted, from, EventMeta::default()));
                }
            }
            tracing::trace!(path = %path.display(), "Filtered event");
            return None;
        }

        let from = if kind == MonitorEventKind::Renamed {
            meta.from.clone()
        } else {
            None
        };
        let _locks = self.lock_paths(path, from.as_deref());
        Some(self.apply(kind, path, meta))
    }

    /// Force analysis of a tracked or trackable file and emit `AnalysisComplete`.
    ///
    /// Runs even when analysis is disabled in the configuration.
    pub fn reanalyze(&self, path: &Path) -> Option<MonitorEvent> {
        let _guard = self.enter()?;
        if !self.filter.accepts(path, false) {
            return None;
        }

        let _lock = self.stripe(path).lock();
        let (size, analysis) = self.load_content(path, &EventMeta::default(), true);
        self.upsert(path, size.unwrap_or(0), analysis.clone());

        Some(self.emit(MonitorEvent {
            kind: MonitorEventKind::AnalysisComplete,
            path: path.to_path_buf(),
            relative_path: self.filter.relative_path(path),
            timestamp: clock::now_millis(),
            size,
            analysis,
            previous_analysis: None,
            previous_path: None,
            message: None,
        }))
    }

    /// Translate a debounced native notification into an event.
    ///
    /// The debouncer only reports that a path changed, so the kind is inferred
    /// from the path's current state and the cache.
    pub(crate) fn handle_native_change(&self, path: &Path) {
        if let Some(kind) = self.infer_kind(path) {
            self.handle_file_system_event(kind, path, None);
        }
    }

    fn infer_kind(&self, path: &Path) -> Option<MonitorEventKind> {
        let has_children = || {
            self.cache
                .read()
                .keys()
                .any(|p| p != path && p.starts_with(path))
        };
        let is_cached = || self.cache.read().contains_key(path);

        match self.source.metadata(path) {
            Ok(meta) if meta.is_dir => (!has_children()).then_some(MonitorEventKind::DirCreated),
            Ok(_) => Some(if is_cached() {
                MonitorEventKind::Modified
            } else {
                MonitorEventKind::Created
            }),
            Err(_) if is_cached() => Some(MonitorEventKind::Deleted),
            Err(_) if has_children() => Some(MonitorEventKind::DirDeleted),
            Err(_) => None,
        }
    }

    fn initial_scan(&self) {
        for root in &self.config.roots {
            let outcome = scanner::scan_root(root, &self.filter, self.config.max_depth);
            for file in &outcome.files {
                if !self.accepting.load(Ordering::SeqCst) {
                    return;
                }
                self.handle_file_system_event(MonitorEventKind::Created, file, None);
            }
            self.handle_file_system_event(MonitorEventKind::AnalysisComplete, root, None);
        }
    }

    fn enter(&self) -> Option<InFlightGuard<'_>> {
        let mut count = self.in_flight.lock();
        if !self.accepting.load(Ordering::SeqCst) {
            return None;
        }
        *count += 1;
        Some(InFlightGuard { monitor: self })
    }

    fn stripe_index(path: &Path) -> usize {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        (hasher.finish() % LOCK_STRIPES as u64) as usize
    }

    fn stripe(&self, path: &Path) -> &Mutex<()> {
        &self.stripes[Self::stripe_index(path)]
    }

    /// Lock the stripes of one or two paths in index order.
    fn lock_paths(
        &self,
        path: &Path,
        other: Option<&Path>,
    ) -> (MutexGuard<'_, ()>, Option<MutexGuard<'_, ()>>) {
        let a = Self::stripe_index(path);
        match other.map(Self::stripe_index) {
            Some(b) if b != a => {
                let (first, second) = if a < b { (a, b) } else { (b, a) };
                let first = self.stripes[first].lock();
                let second = self.stripes[second].lock();
                (first, Some(second))
            }
            _ => (self.stripes[a].lock(), None),
        }
    }

    /// Apply an accepted event. Caller holds the path's stripe lock.
    fn apply(&self, kind: MonitorEventKind, path: &Path, meta: EventMeta) -> MonitorEvent {
        let mut size = meta.size;
        let mut analysis = None;
        let mut previous_analysis = None;
        let mut previous_path = None;

        match kind {
            MonitorEventKind::Created | MonitorEventKind::Modified | MonitorEventKind::Renamed => {
                if kind == MonitorEventKind::Renamed {
                    if let Some(from) = &meta.from {
                        self.purge(from);
                        previous_path = Some(from.clone());
                    }
                }
                let (loaded_size, loaded) = self.load_content(path, &meta, false);
                size = loaded_size;
                let previous = self.upsert(path, size.unwrap_or(0), loaded.clone());
                if kind == MonitorEventKind::Modified {
                    previous_analysis = previous.and_then(|e| e.analysis);
                }
                analysis = loaded;
            }
            MonitorEventKind::Deleted => {
                if let Some(entry) = self.purge(path) {
                    size = size.or(Some(entry.size));
                }
            }
            MonitorEventKind::DirDeleted => {
                let purged = self.purge_under(path);
                tracing::debug!(path = %path.display(), purged, "Directory removed");
            }
            MonitorEventKind::DirCreated
            | MonitorEventKind::AnalysisComplete
            | MonitorEventKind::Error => {}
        }

        self.emit(MonitorEvent {
            kind,
            path: path.to_path_buf(),
            relative_path: self.filter.relative_path(path),
            timestamp: clock::now_millis(),
            size,
            analysis,
            previous_analysis,
            previous_path,
            message: meta.message,
        })
    }

    /// Read and analyze a file. Failures are recorded and yield no analysis.
    fn load_content(
        &self,
        path: &Path,
        meta: &EventMeta,
        force: bool,
    ) -> (Option<u64>, Option<Arc<FileAnalysis>>) {
        let metadata = match self.source.metadata(path) {
            Ok(m) => Some(m),
            Err(e) if meta.size.is_none() => {
                self.analysis_failed(path, e.to_string());
                return (None, None);
            }
            Err(_) => None,
        };

        let size = meta.size.or(metadata.map(|m| m.size)).unwrap_or(0);
        if !(force || self.config.analysis_enabled) || size > self.config.max_file_size {
            return (Some(size), None);
        }

        let content = match self.source.read(path) {
            Ok(content) => content,
            Err(e) => {
                self.analysis_failed(path, e.to_string());
                return (Some(size), None);
            }
        };
        let size = meta.size.unwrap_or(content.len() as u64);
        if size > self.config.max_file_size {
            return (Some(size), None);
        }

        let modified = meta
            .modified
            .or_else(|| metadata.and_then(|m| m.modified))
            .unwrap_or_else(clock::now);

        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyzer.analyze_file_at(path, &content, modified)
        })) {
            Ok(analysis) => (Some(size), Some(Arc::new(analysis))),
            Err(payload) => {
                self.analysis_failed(path, panic_message(payload.as_ref()));
                (Some(size), None)
            }
        }
    }

    fn analysis_failed(&self, path: &Path, reason: String) {
        let err = MonitorError::analysis_failed(path, reason);
        tracing::warn!(error = %err, "Analysis failed");
        self.stats.lock().error_count += 1;
        metrics::ANALYSIS_FAILURES.inc();
    }

    /// Cache a file, replacing any previous entry.
    fn upsert(
        &self,
        path: &Path,
        size: u64,
        analysis: Option<Arc<FileAnalysis>>,
    ) -> Option<CacheEntry> {
        let language = analysis
            .as_ref()
            .map_or_else(|| Language::from_path(path), |a| a.language);
        let (previous, tracked) = {
            let mut cache = self.cache.write();
            let previous = cache.insert(
                path.to_path_buf(),
                CacheEntry {
                    language,
                    size,
                    analysis,
                },
            );
            (previous, cache.len())
        };

        {
            let mut stats = self.stats.lock();
            match &previous {
                Some(old) if old.language == language => stats.resize(old.size, size),
                Some(old) => {
                    stats.untrack(old.language, old.size);
                    stats.track(language, size);
                }
                None => stats.track(language, size),
            }
        }
        metrics::FILES_TRACKED.set(i64::try_from(tracked).unwrap_or(i64::MAX));
        previous
    }

    fn purge(&self, path: &Path) -> Option<CacheEntry> {
        let (removed, tracked) = {
            let mut cache = self.cache.write();
            (cache.remove(path), cache.len())
        };
        if let Some(entry) = &removed {
            self.stats.lock().untrack(entry.language, entry.size);
            metrics::FILES_TRACKED.set(i64::try_from(tracked).unwrap_or(i64::MAX));
        }
        removed
    }

    fn purge_under(&self, dir: &Path) -> usize {
        let (removed, tracked) = {
            let mut cache = self.cache.write();
            let paths: Vec<PathBuf> = cache
                .keys()
                .filter(|p| p.starts_with(dir))
                .cloned()
                .collect();
            let removed: Vec<CacheEntry> = paths.iter().filter_map(|p| cache.remove(p)).collect();
            (removed, cache.len())
        };

        if !removed.is_empty() {
            let mut stats = self.stats.lock();
            for entry in &removed {
                stats.untrack(entry.language, entry.size);
            }
            metrics::FILES_TRACKED.set(i64::try_from(tracked).unwrap_or(i64::MAX));
        }
        removed.len()
    }

    fn emit(&self, event: MonitorEvent) -> MonitorEvent {
        self.stats.lock().record(&event);
        metrics::EVENTS_TOTAL
            .with_label_values(&[event.kind.as_str()])
            .inc();
        self.dispatch(&event);
        event
    }

    fn dispatch(&self, event: &MonitorEvent) {
        let subscribers: Vec<(SubscriberId, Arc<dyn EventSubscriber>)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        for (id, subscriber) in subscribers {
            let failure = match panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event)))
            {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
            };

            if let Some(reason) = failure {
                tracing::warn!(
                    subscriber = id,
                    kind = %event.kind,
                    path = %event.path.display(),
                    reason = %reason,
                    "Subscriber failed"
                );
                self.stats.lock().subscriber_failures += 1;
                metrics::SUBSCRIBER_FAILURES.inc();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
