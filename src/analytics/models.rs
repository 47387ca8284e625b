//! Analytics report types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::Language;

/// Why a file is a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotReason {
    HighComplexity,
    FrequentChanges,
    LargeFile,
    ManyDependencies,
}

impl HotspotReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighComplexity => "high_complexity",
            Self::FrequentChanges => "frequent_changes",
            Self::LargeFile => "large_file",
            Self::ManyDependencies => "many_dependencies",
        }
    }
}

/// Hotspot severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Metrics a hotspot score was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotDetails {
    pub complexity: u32,
    pub lines: usize,
    pub size: u64,
    pub change_frequency: u64,
    pub dependency_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeHotspot {
    pub path: PathBuf,
    pub reason: HotspotReason,
    pub score: f64,
    pub severity: Severity,
    pub details: HotspotDetails,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellKind {
    LongMethod,
    LargeClass,
    ComplexConditional,
}

/// Smell severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellSeverity {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSmell {
    pub path: PathBuf,
    pub kind: SmellKind,
    /// Function, method (`Class.method`) or class name.
    pub name: String,
    pub line: usize,
    pub severity: SmellSeverity,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DesignPattern,
    AntiPattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub path: PathBuf,
    /// `singleton`, `observer`, `factory`, `god_class` or `long_parameter_list`.
    pub name: String,
    pub kind: PatternKind,
    /// Class or function the pattern was found on.
    pub location: String,
    pub line: usize,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// One recorded complexity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityPoint {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub complexity: u32,
}

/// Complexity movement over the retained history of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityTrend {
    pub path: PathBuf,
    pub first: u32,
    pub current: u32,
    pub change: i64,
    pub direction: TrendDirection,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    Import,
    Export,
    DynamicImport,
    Require,
}

impl EdgeRelation {
    /// Relations followed by cycle detection.
    #[must_use]
    pub const fn is_import(self) -> bool {
        !matches!(self, Self::Export)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// File path.
    pub id: String,
    /// File name.
    pub label: String,
    pub language: Language,
    pub size: u64,
    pub complexity: u32,
    /// Degree centrality in `[0, 1]`.
    pub centrality: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: EdgeRelation,
    /// References collapsed into this edge.
    pub weight: u32,
}

/// Files sharing a parent directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCluster {
    pub id: String,
    pub label: String,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub clusters: Vec<GraphCluster>,
    /// Import cycles as node-id lists starting at the smallest id.
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub file_count: usize,
    pub average_complexity: f64,
    /// Dependency references across all files.
    pub dependency_count: usize,
    pub circular_dependency_count: usize,
    pub pattern_count: usize,
    pub hotspot_count: usize,
    pub smell_count: usize,
    /// Inputs rejected as malformed since the engine was created.
    pub skipped_inputs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub hotspots: Vec<CodeHotspot>,
    pub smells: Vec<CodeSmell>,
    pub patterns: Vec<DetectedPattern>,
    pub trends: Vec<ComplexityTrend>,
    pub dependency_graph: DependencyGraph,
    pub recommendations: Vec<String>,
}
