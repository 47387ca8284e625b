//! Fan-out from the directory monitor to the search index and analytics engine.
//!
//! The [`Pipeline`] subscriber only enqueues. Two worker tasks drain their
//! own channel, so a slow index update never delays analytics or the monitor.
//! Events for one path stay in order because each channel is FIFO and the
//! monitor dispatches a path's events in order.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analytics::AnalyticsEngine;
use crate::analyzer::is_binary_extension;
use crate::search::SearchIndex;
use crate::watcher::{ContentSource, EventSubscriber, MonitorEvent, MonitorEventKind};
use crate::{Error, Result};

/// Counters for pipeline activity.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub events_received: AtomicU64,
    pub documents_indexed: AtomicU64,
    pub documents_removed: AtomicU64,
    pub analyses_recorded: AtomicU64,
    pub read_failures: AtomicU64,
}

impl PipelineStats {
    #[must_use]
    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_removed: self.documents_removed.load(Ordering::Relaxed),
            analyses_recorded: self.analyses_recorded.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStatsSnapshot {
    pub events_received: u64,
    pub documents_indexed: u64,
    pub documents_removed: u64,
    pub analyses_recorded: u64,
    pub read_failures: u64,
}

/// Monitor subscriber feeding the worker tasks.
#[derive(Debug)]
pub struct Pipeline {
    index_tx: mpsc::UnboundedSender<Arc<MonitorEvent>>,
    analytics_tx: mpsc::UnboundedSender<Arc<MonitorEvent>>,
    stats: Arc<PipelineStats>,
}

/// Handles of the worker tasks.
///
/// Workers exit once every [`Pipeline`] handle is dropped and their queues
/// are drained.
#[derive(Debug)]
pub struct PipelineWorkers {
    index: JoinHandle<()>,
    analytics: JoinHandle<()>,
}

impl PipelineWorkers {
    /// Wait for both workers to drain and exit.
    pub async fn join(self) {
        for (name, handle) in [("index", self.index), ("analytics", self.analytics)] {
            if let Err(e) = handle.await {
                tracing::error!(worker = name, error = %e, "Pipeline worker failed");
            }
        }
    }
}

impl Pipeline {
    /// Spawn the workers on the current tokio runtime.
    ///
    /// `source` is used by the index worker to read file content. Files
    /// larger than `max_file_size` bytes are never indexed.
    #[must_use]
    pub fn spawn(
        index: Arc<SearchIndex>,
        analytics: Arc<AnalyticsEngine>,
        source: Arc<dyn ContentSource>,
        max_file_size: u64,
    ) -> (Arc<Self>, PipelineWorkers) {
        let (index_tx, index_rx) = mpsc::unbounded_channel();
        let (analytics_tx, analytics_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(PipelineStats::default());

        let workers = PipelineWorkers {
            index: tokio::spawn(run_index_worker(
                IndexWorker {
                    index,
                    source,
                    max_file_size,
                    stats: Arc::clone(&stats),
                },
                index_rx,
            )),
            analytics: tokio::spawn(run_analytics_worker(
                analytics,
                analytics_rx,
                Arc::clone(&stats),
            )),
        };

        tracing::debug!("Pipeline workers started");
        (
            Arc::new(Self {
                index_tx,
                analytics_tx,
                stats,
            }),
            workers,
        )
    }

    /// Current activity counters.
    #[must_use]
    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.stats.snapshot()
    }
}

impl EventSubscriber for Pipeline {
    fn on_event(&self, event: &MonitorEvent) -> Result<()> {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);
        let event = Arc::new(event.clone());
        let index = self.index_tx.send(Arc::clone(&event));
        let analytics = self.analytics_tx.send(event);
        if index.is_err() || analytics.is_err() {
            return Err(Error::internal("pipeline worker has stopped"));
        }
        Ok(())
    }
}

struct IndexWorker {
    index: Arc<SearchIndex>,
    source: Arc<dyn ContentSource>,
    max_file_size: u64,
    stats: Arc<PipelineStats>,
}

async fn run_index_worker(worker: IndexWorker, mut rx: mpsc::UnboundedReceiver<Arc<MonitorEvent>>) {
    let IndexWorker { index, stats, .. } = &worker;
    while let Some(event) = rx.recv().await {
        match event.kind {
            MonitorEventKind::Deleted => {
                if index.remove_file(&event.path) {
                    stats.documents_removed.fetch_add(1, Ordering::Relaxed);
                }
            }
            MonitorEventKind::DirDeleted => {
                let removed = index.remove_prefix(&event.path);
                stats.documents_removed.fetch_add(removed as u64, Ordering::Relaxed);
            }
            MonitorEventKind::Created
            | MonitorEventKind::Modified
            | MonitorEventKind::Renamed
            | MonitorEventKind::AnalysisComplete => {
                if let Some(previous) = &event.previous_path {
                    if index.remove_file(previous) {
                        stats.documents_removed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                worker.index_event(&event).await;
            }
            MonitorEventKind::DirCreated | MonitorEventKind::Error => {}
        }
    }
    tracing::debug!("Index worker stopped");
}

impl IndexWorker {
    async fn index_event(&self, event: &MonitorEvent) {
        let binary = event.analysis.as_ref().map_or_else(
            || is_binary_extension(&event.path),
            |a| a.is_binary,
        );
        if binary || event.size.is_some_and(|size| size > self.max_file_size) {
            self.drop_document(&event.path);
            return;
        }

        let content = match read_content(&self.source, &event.path).await {
            Ok(content) => content,
            Err(e) => {
                self.stats.read_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(path = %event.path.display(), error = %e, "Failed to read file for indexing");
                return;
            }
        };
        // The file may have grown since the event was built.
        if content.len() as u64 > self.max_file_size || content.contains(&0) {
            self.drop_document(&event.path);
            return;
        }

        let text = String::from_utf8_lossy(&content);
        if self.index.index_file(&event.path, &text, event.analysis.as_deref()) {
            self.stats.documents_indexed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Forget a file that is no longer indexable.
    fn drop_document(&self, path: &Path) {
        if self.index.remove_file(path) {
            self.stats.documents_removed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %path.display(), "File no longer indexable");
        }
    }
}

async fn read_content(source: &Arc<dyn ContentSource>, path: &Path) -> Result<Vec<u8>> {
    let source = Arc::clone(source);
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || source.read(&path))
        .await
        .map_err(|e| Error::internal(format!("read task failed: {e}")))?
        .map_err(Error::from)
}

async fn run_analytics_worker(
    analytics: Arc<AnalyticsEngine>,
    mut rx: mpsc::UnboundedReceiver<Arc<MonitorEvent>>,
    stats: Arc<PipelineStats>,
) {
    while let Some(event) = rx.recv().await {
        match event.kind {
            MonitorEventKind::Deleted => {
                analytics.remove_file(&event.path);
            }
            MonitorEventKind::DirDeleted => {
                analytics.remove_prefix(&event.path);
            }
            _ => {
                if let Some(previous) = &event.previous_path {
                    analytics.remove_file(previous);
                }
                if let Some(analysis) = &event.analysis {
                    analytics.process_file_analysis(Arc::clone(analysis), Some(&event));
                    stats.analyses_recorded.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
    tracing::debug!("Analytics worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FileAnalyzer;
    use crate::config::DEFAULT_MAX_FILE_SIZE;
    use crate::search::{SearchMode, SearchQuery};
    use crate::watcher::MemoryContentSource;
    use std::path::PathBuf;

    fn event(kind: MonitorEventKind, path: &str, content: Option<&str>) -> MonitorEvent {
        MonitorEvent {
            kind,
            path: PathBuf::from(path),
            relative_path: PathBuf::from(path),
            timestamp: 1,
            size: content.map(|c| c.len() as u64),
            analysis: content.map(|c| {
                Arc::new(FileAnalyzer::new().analyze_file(Path::new(path), c.as_bytes()))
            }),
            previous_analysis: None,
            previous_path: None,
            message: None,
        }
    }

    struct Fixture {
        index: Arc<SearchIndex>,
        analytics: Arc<AnalyticsEngine>,
        source: Arc<MemoryContentSource>,
        pipeline: Arc<Pipeline>,
        workers: PipelineWorkers,
    }

    fn fixture() -> Fixture {
        fixture_with_limit(DEFAULT_MAX_FILE_SIZE)
    }

    fn fixture_with_limit(max_file_size: u64) -> Fixture {
        let index = Arc::new(SearchIndex::new());
        let analytics = Arc::new(AnalyticsEngine::new());
        let source = Arc::new(MemoryContentSource::new());
        let (pipeline, workers) = Pipeline::spawn(
            Arc::clone(&index),
            Arc::clone(&analytics),
            source.clone(),
            max_file_size,
        );
        Fixture {
            index,
            analytics,
            source,
            pipeline,
            workers,
        }
    }

    fn send(fixture: &Fixture, path: &str, content: &str, kind: MonitorEventKind) {
        fixture.source.insert(path, content);
        fixture
            .pipeline
            .on_event(&event(kind, path, Some(content)))
            .unwrap();
    }

    #[tokio::test]
    async fn test_events_reach_index_and_analytics() {
        let f = fixture();
        send(&f, "/repo/a.ts", "function calculateSum(a, b) { return a + b; }\n", MonitorEventKind::Created);
        send(&f, "/repo/b.ts", "function calculateProduct(a, b) { return a * b; }\n", MonitorEventKind::Created);
        send(&f, "/repo/b.ts", "function calculateProduct(a, b) { if (a) { return a * b; } }\n", MonitorEventKind::Modified);

        let Fixture {
            index,
            analytics,
            pipeline,
            workers,
            ..
        } = f;
        let stats_before = pipeline.stats();
        drop(pipeline);
        workers.join().await;

        assert_eq!(stats_before.events_received, 3);
        assert_eq!(index.document_count(), 2);
        let results = index
            .search(&SearchQuery::new("calculate").with_mode(SearchMode::FullText))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(analytics.file_count(), 2);
        assert_eq!(analytics.get_change_frequency(Path::new("/repo/b.ts")), 1);
        assert_eq!(analytics.get_complexity_history(Path::new("/repo/b.ts")).len(), 2);
    }

    #[tokio::test]
    async fn test_removals_propagate() {
        let f = fixture();
        send(&f, "/repo/src/a.ts", "export const a = 1;\n", MonitorEventKind::Created);
        send(&f, "/repo/src/b.ts", "export const b = 2;\n", MonitorEventKind::Created);
        send(&f, "/repo/lib/c.ts", "export const c = 3;\n", MonitorEventKind::Created);

        f.pipeline
            .on_event(&event(MonitorEventKind::Deleted, "/repo/lib/c.ts", None))
            .unwrap();
        f.pipeline
            .on_event(&event(MonitorEventKind::DirDeleted, "/repo/src", None))
            .unwrap();

        let Fixture {
            index,
            analytics,
            pipeline,
            workers,
            ..
        } = f;
        drop(pipeline);
        workers.join().await;

        assert_eq!(index.document_count(), 0);
        assert_eq!(analytics.file_count(), 0);
    }

    #[tokio::test]
    async fn test_rename_moves_document() {
        let f = fixture();
        send(&f, "/repo/old.ts", "export const renamedValue = 1;\n", MonitorEventKind::Created);
        f.source.remove(Path::new("/repo/old.ts"));
        f.source.insert("/repo/new.ts", "export const renamedValue = 1;\n");

        let mut renamed = event(
            MonitorEventKind::Renamed,
            "/repo/new.ts",
            Some("export const renamedValue = 1;\n"),
        );
        renamed.previous_path = Some(PathBuf::from("/repo/old.ts"));
        f.pipeline.on_event(&renamed).unwrap();

        let Fixture {
            index,
            analytics,
            pipeline,
            workers,
            ..
        } = f;
        drop(pipeline);
        workers.join().await;

        assert!(!index.contains(Path::new("/repo/old.ts")));
        assert!(index.contains(Path::new("/repo/new.ts")));
        assert_eq!(analytics.file_count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_content_is_counted() {
        let f = fixture();
        f.pipeline
            .on_event(&event(MonitorEventKind::Created, "/repo/gone.ts", Some("let x = 1;\n")))
            .unwrap();

        let Fixture {
            index,
            pipeline,
            workers,
            ..
        } = f;
        let stats = Arc::clone(&pipeline.stats);
        drop(pipeline);
        workers.join().await;

        assert_eq!(stats.snapshot().read_failures, 1);
        assert_eq!(index.document_count(), 0);
    }

    #[tokio::test]
    async fn test_files_over_size_limit_are_not_indexed() {
        let f = fixture_with_limit(32);
        let small = "export const a = 1;\n";
        let large = "export const tooLargeToIndex = 'xxxxxxxxxxxxxxxxxxxx';\n";
        send(&f, "/repo/small.ts", small, MonitorEventKind::Created);
        send(&f, "/repo/grown.ts", small, MonitorEventKind::Created);

        // Tracked only: the monitor skipped analysis because of the size.
        f.source.insert("/repo/big.ts", large);
        let mut big = event(MonitorEventKind::Created, "/repo/big.ts", None);
        big.size = Some(large.len() as u64);
        f.pipeline.on_event(&big).unwrap();

        // Grew past the limit after the event was built.
        f.source.insert("/repo/grown.ts", large);
        let mut grown = event(MonitorEventKind::Modified, "/repo/grown.ts", None);
        grown.size = Some(small.len() as u64);
        f.pipeline.on_event(&grown).unwrap();

        let Fixture {
            index,
            pipeline,
            workers,
            ..
        } = f;
        drop(pipeline);
        workers.join().await;

        assert!(index.contains(Path::new("/repo/small.ts")));
        assert!(!index.contains(Path::new("/repo/big.ts")));
        assert!(!index.contains(Path::new("/repo/grown.ts")));
    }
}
