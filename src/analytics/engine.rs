//! The analytics engine: per-file state plus on-demand reports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use super::graph::build_graph;
use super::hotspots::{detect_hotspots, FileMetrics};
use super::models::{
    AnalyticsReport, CodeHotspot, CodeSmell, ComplexityPoint, ComplexityTrend, DependencyGraph,
    ReportSummary, Severity, SmellSeverity, TrendDirection,
};
use super::patterns::detect_patterns;
use super::smells::detect_smells;
use super::thresholds::AnalyticsThresholds;
use crate::analyzer::FileAnalysis;
use crate::bounded::BoundedLog;
use crate::observability::spans;
use crate::watcher::{MonitorEvent, MonitorEventKind};
use crate::{clock, metrics};

#[derive(Debug, Default)]
struct EngineState {
    files: HashMap<PathBuf, Arc<FileAnalysis>>,
    history: HashMap<PathBuf, BoundedLog<ComplexityPoint>>,
    changes: HashMap<PathBuf, u64>,
}

/// Everything a report needs, copied out of the engine under one read lock.
struct Snapshot {
    /// Sorted by path.
    files: Vec<Arc<FileAnalysis>>,
    changes: HashMap<PathBuf, u64>,
    trends: Vec<ComplexityTrend>,
}

/// Maintains per-file complexity history and change counts and derives
/// code-quality reports from them.
///
/// Reports are computed from a snapshot, so a slow report never blocks
/// incoming analyses for longer than the copy.
#[derive(Debug)]
pub struct AnalyticsEngine {
    state: RwLock<EngineState>,
    skipped: AtomicU64,
    thresholds: AnalyticsThresholds,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_thresholds(AnalyticsThresholds::default())
    }

    #[must_use]
    pub fn with_thresholds(thresholds: AnalyticsThresholds) -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            skipped: AtomicU64::new(0),
            thresholds,
        }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &AnalyticsThresholds {
        &self.thresholds
    }

    /// Record an analysis.
    ///
    /// Appends a complexity point stamped with the event time (or now) and
    /// counts a change when the event is a modification. Analyses with an
    /// empty path or zero complexity are counted as skipped and ignored.
    pub fn process_file_analysis(&self, analysis: Arc<FileAnalysis>, event: Option<&MonitorEvent>) {
        if analysis.path.as_os_str().is_empty() || analysis.complexity == 0 {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %analysis.path.display(), "Skipping malformed analysis");
            return;
        }

        let timestamp = event.map_or_else(clock::now_millis, |e| e.timestamp);
        let path = analysis.path.clone();
        let mut state = self.state.write();

        state
            .history
            .entry(path.clone())
            .or_insert_with(|| BoundedLog::new(self.thresholds.history_capacity))
            .push(ComplexityPoint {
                timestamp,
                complexity: analysis.complexity,
            });

        if event.is_some_and(|e| e.kind == MonitorEventKind::Modified) {
            *state.changes.entry(path.clone()).or_insert(0) += 1;
        }

        state.files.insert(path, analysis);
    }

    /// Stop reporting on a file. Its history is kept.
    pub fn remove_file(&self, path: &Path) -> bool {
        self.state.write().files.remove(path).is_some()
    }

    /// Stop reporting on every file under a directory. Returns how many were removed.
    pub fn remove_prefix(&self, dir: &Path) -> usize {
        let mut state = self.state.write();
        let before = state.files.len();
        state.files.retain(|path, _| !path.starts_with(dir));
        before - state.files.len()
    }

    /// Malformed inputs skipped since creation.
    #[must_use]
    pub fn skipped_inputs(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Files currently reported on.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    /// Retained complexity points for a path, oldest first.
    #[must_use]
    pub fn get_complexity_history(&self, path: &Path) -> Vec<ComplexityPoint> {
        self.state
            .read()
            .history
            .get(path)
            .map(|log| log.oldest_first().copied().collect())
            .unwrap_or_default()
    }

    /// Modifications seen for a path.
    #[must_use]
    pub fn get_change_frequency(&self, path: &Path) -> u64 {
        self.state.read().changes.get(path).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn get_dependency_graph(&self) -> DependencyGraph {
        let files = self.snapshot().files;
        build_graph(&files, self.thresholds.max_cycles)
    }

    /// Build a fresh report.
    ///
    /// Two calls with no input in between produce identical reports apart
    /// from `generated_at`.
    #[must_use]
    pub fn generate_report(&self) -> AnalyticsReport {
        let started = Instant::now();
        let snapshot = self.snapshot();
        let span = spans::report_span(snapshot.files.len());
        let _enter = span.enter();
        let t = &self.thresholds;

        let mut hotspots: Vec<CodeHotspot> = snapshot
            .files
            .iter()
            .flat_map(|file| {
                let metrics = FileMetrics {
                    path: &file.path,
                    complexity: file.complexity,
                    lines: file.lines,
                    size: file.size,
                    changes: snapshot.changes.get(&file.path).copied().unwrap_or(0),
                    dependencies: file.dependencies.len(),
                };
                detect_hotspots(&metrics, t)
            })
            .collect();
        hotspots.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.reason.cmp(&b.reason))
        });

        let mut smells: Vec<CodeSmell> = snapshot
            .files
            .iter()
            .flat_map(|file| detect_smells(file, t))
            .collect();
        smells.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.line.cmp(&b.line))
        });

        let patterns: Vec<_> = snapshot
            .files
            .iter()
            .flat_map(|file| detect_patterns(file, t))
            .collect();

        let dependency_graph = build_graph(&snapshot.files, t.max_cycles);
        let recommendations = self.recommendations(&hotspots, &smells, &dependency_graph);

        let file_count = snapshot.files.len();
        #[allow(clippy::cast_precision_loss)]
        let average_complexity = if file_count == 0 {
            0.0
        } else {
            snapshot
                .files
                .iter()
                .map(|f| f64::from(f.complexity))
                .sum::<f64>()
                / file_count as f64
        };

        let summary = ReportSummary {
            file_count,
            average_complexity,
            dependency_count: snapshot.files.iter().map(|f| f.dependencies.len()).sum(),
            circular_dependency_count: dependency_graph.cycles.len(),
            pattern_count: patterns.len(),
            hotspot_count: hotspots.len(),
            smell_count: smells.len(),
            skipped_inputs: self.skipped_inputs(),
        };

        metrics::REPORT_DURATION.observe(started.elapsed().as_secs_f64());
        tracing::info!(
            files = summary.file_count,
            hotspots = summary.hotspot_count,
            smells = summary.smell_count,
            cycles = summary.circular_dependency_count,
            elapsed_ms = started.elapsed().as_millis(),
            "Generated analytics report"
        );

        AnalyticsReport {
            generated_at: clock::now(),
            summary,
            hotspots,
            smells,
            patterns,
            trends: snapshot.trends,
            dependency_graph,
            recommendations,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.read();

        let mut files: Vec<Arc<FileAnalysis>> = state.files.values().cloned().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let changes = files
            .iter()
            .filter_map(|f| state.changes.get(&f.path).map(|c| (f.path.clone(), *c)))
            .collect();

        let mut trends: Vec<ComplexityTrend> = files
            .iter()
            .filter_map(|f| state.history.get(&f.path).and_then(|log| trend_of(&f.path, log)))
            .collect();
        drop(state);

        trends.sort_by(|a, b| {
            b.change
                .abs()
                .cmp(&a.change.abs())
                .then_with(|| a.path.cmp(&b.path))
        });

        Snapshot {
            files,
            changes,
            trends,
        }
    }

    /// Ranked, deduplicated advice drawn from hotspots, cycles and major smells.
    fn recommendations(
        &self,
        hotspots: &[CodeHotspot],
        smells: &[CodeSmell],
        graph: &DependencyGraph,
    ) -> Vec<String> {
        let mut ranked: Vec<(Severity, String)> = Vec::new();

        for hotspot in hotspots {
            for text in &hotspot.recommendations {
                ranked.push((hotspot.severity, text.clone()));
            }
        }
        if !graph.cycles.is_empty() {
            ranked.push((
                Severity::High,
                format!(
                    "Break {} circular dependency chain(s) starting at {}",
                    graph.cycles.len(),
                    graph.cycles[0].first().map_or("", String::as_str)
                ),
            ));
        }
        for smell in smells {
            let severity = match smell.severity {
                SmellSeverity::Critical => Severity::High,
                SmellSeverity::Major => Severity::Medium,
                SmellSeverity::Minor => continue,
            };
            ranked.push((severity, smell.suggestion.clone()));
        }

        // Stable sort keeps discovery order within a severity.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut out: Vec<String> = Vec::new();
        for (_, text) in ranked {
            if out.len() == self.thresholds.max_recommendations {
                break;
            }
            if !out.contains(&text) {
                out.push(text);
            }
        }
        out
    }
}

fn trend_of(path: &Path, log: &BoundedLog<ComplexityPoint>) -> Option<ComplexityTrend> {
    if log.len() < 2 {
        return None;
    }
    let first = log.oldest_first().next()?.complexity;
    let current = log.newest_first().next()?.complexity;
    let change = i64::from(current) - i64::from(first);
    let direction = match change {
        c if c > 0 => TrendDirection::Increasing,
        c if c < 0 => TrendDirection::Decreasing,
        _ => TrendDirection::Stable,
    };
    Some(ComplexityTrend {
        path: path.to_path_buf(),
        first,
        current,
        change,
        direction,
        samples: log.len(),
    })
}
