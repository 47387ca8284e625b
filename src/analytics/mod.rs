//! Code-quality analytics over file analyses.
//!
//! This module provides:
//! - Hotspot scoring from complexity, size, churn and coupling
//! - Smell and pattern heuristics over extracted declarations
//! - A file dependency graph with cycle detection
//! - [`AnalyticsEngine`], which keeps per-file history and builds reports
//!
//! Nothing here returns an error. Malformed inputs are skipped and counted.

mod engine;
mod graph;
mod hotspots;
mod models;
mod patterns;
mod smells;
mod thresholds;

pub use engine::AnalyticsEngine;
pub use graph::{build_graph, find_cycles};
pub use hotspots::{detect_hotspots, hotspot_score, severity_for, FileMetrics};
pub use models::{
    AnalyticsReport, CodeHotspot, CodeSmell, ComplexityPoint, ComplexityTrend, DependencyGraph,
    DetectedPattern, EdgeRelation, GraphCluster, GraphEdge, GraphNode, HotspotDetails,
    HotspotReason, PatternKind, ReportSummary, Severity, SmellKind, SmellSeverity,
    TrendDirection,
};
pub use patterns::detect_patterns;
pub use smells::{detect_smells, smell_severity};
pub use thresholds::AnalyticsThresholds;
