//! Hotspot scoring.
//!
//! Each metric is normalized against its scale so 1.0 marks the threshold.
//! A file gets one hotspot per metric at or above 1.0, scored as a weighted
//! sum of that metric and the mean of all four. Every weight is positive, so
//! the score never decreases when an input grows. The size metric is the
//! larger of the line and byte ratios, so long minified files count as large.

use std::path::Path;

use super::models::{CodeHotspot, HotspotDetails, HotspotReason, Severity};
use super::thresholds::AnalyticsThresholds;

/// Raw per-file inputs to hotspot scoring.
#[derive(Debug, Clone, Copy)]
pub struct FileMetrics<'a> {
    pub path: &'a Path,
    pub complexity: u32,
    pub lines: usize,
    pub size: u64,
    pub changes: u64,
    pub dependencies: usize,
}

impl FileMetrics<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn normalized(&self, t: &AnalyticsThresholds) -> [(HotspotReason, f64); 4] {
        [
            (
                HotspotReason::HighComplexity,
                f64::from(self.complexity) / t.complexity_scale,
            ),
            (
                HotspotReason::FrequentChanges,
                self.changes as f64 / t.changes_scale,
            ),
            (
                HotspotReason::LargeFile,
                (self.lines as f64 / t.lines_scale).max(self.size as f64 / t.bytes_scale),
            ),
            (
                HotspotReason::ManyDependencies,
                self.dependencies as f64 / t.dependencies_scale,
            ),
        ]
    }

    fn details(&self) -> HotspotDetails {
        HotspotDetails {
            complexity: self.complexity,
            lines: self.lines,
            size: self.size,
            change_frequency: self.changes,
            dependency_count: self.dependencies,
        }
    }
}

/// Weighted hotspot score.
#[must_use]
pub fn hotspot_score(primary: f64, all: &[f64], t: &AnalyticsThresholds) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let mean = if all.is_empty() {
        0.0
    } else {
        all.iter().sum::<f64>() / all.len() as f64
    };
    t.primary_weight * primary + t.mean_weight * mean
}

#[must_use]
pub fn severity_for(score: f64, t: &AnalyticsThresholds) -> Severity {
    if score >= t.critical_score {
        Severity::Critical
    } else if score >= t.high_score {
        Severity::High
    } else if score >= t.medium_score {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Hotspots raised by one file, in reason order.
#[must_use]
pub fn detect_hotspots(metrics: &FileMetrics<'_>, t: &AnalyticsThresholds) -> Vec<CodeHotspot> {
    let normalized = metrics.normalized(t);
    let values: Vec<f64> = normalized.iter().map(|(_, v)| *v).collect();

    normalized
        .iter()
        .filter(|(_, value)| *value >= 1.0)
        .map(|&(reason, value)| {
            let score = hotspot_score(value, &values, t);
            CodeHotspot {
                path: metrics.path.to_path_buf(),
                reason,
                score,
                severity: severity_for(score, t),
                details: metrics.details(),
                recommendations: recommendations_for(reason),
            }
        })
        .collect()
}

fn recommendations_for(reason: HotspotReason) -> Vec<String> {
    let lines: &[&str] = match reason {
        HotspotReason::HighComplexity => &[
            "Split complex functions into smaller units",
            "Add tests around the branching logic",
        ],
        HotspotReason::FrequentChanges => &[
            "Stabilize the interface of this frequently changed file",
            "Review recent changes for churn",
        ],
        HotspotReason::LargeFile => &["Break the file into focused modules"],
        HotspotReason::ManyDependencies => &["Reduce coupling by consolidating imports"],
    };
    lines.iter().map(|s| (*s).to_string()).collect()
}
