//! Monitor event types.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::FileAnalysis;

/// Kind of a monitor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorEventKind {
    Created,
    Modified,
    Deleted,
    /// File moved; the event carries the previous path.
    Renamed,
    DirCreated,
    DirDeleted,
    /// Analysis finished outside a create/modify (forced re-analysis, end of initial scan).
    AnalysisComplete,
    Error,
}

impl MonitorEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::DirCreated => "dir_created",
            Self::DirDeleted => "dir_deleted",
            Self::AnalysisComplete => "analysis_complete",
            Self::Error => "error",
        }
    }

    /// Directory events skip extension filtering.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::DirCreated | Self::DirDeleted)
    }

    /// Events that read file content and may carry an analysis.
    #[must_use]
    pub const fn reads_content(self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Renamed)
    }

    /// Events that remove a path from the cache.
    #[must_use]
    pub const fn is_removal(self) -> bool {
        matches!(self, Self::Deleted | Self::DirDeleted)
    }
}

impl std::fmt::Display for MonitorEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional metadata delivered with a file-system notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    /// Size in bytes, when the notifier already knows it.
    pub size: Option<u64>,
    /// Previous path of a rename.
    pub from: Option<PathBuf>,
    /// Last-modified time, when the notifier already knows it.
    pub modified: Option<DateTime<Utc>>,
    /// Error description for `Error` events.
    pub message: Option<String>,
}

impl EventMeta {
    /// Metadata for a rename from `from`.
    #[must_use]
    pub fn renamed_from(from: impl Into<PathBuf>) -> Self {
        Self {
            from: Some(from.into()),
            ..Self::default()
        }
    }

    /// Metadata for an `Error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// A change observed by the monitor. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    pub kind: MonitorEventKind,
    /// Path as delivered by the notifier.
    pub path: PathBuf,
    /// Path relative to the longest owning root, or the absolute path when
    /// the path is outside every root.
    pub relative_path: PathBuf,
    /// Unix milliseconds, non-decreasing within the process.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Arc<FileAnalysis>>,
    /// Analysis cached before this event. Only set on `Modified`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_analysis: Option<Arc<FileAnalysis>>,
    /// Old path of a `Renamed` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<PathBuf>,
    /// Description of an `Error` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(MonitorEventKind::DirCreated.is_dir());
        assert!(!MonitorEventKind::Created.is_dir());
        assert!(MonitorEventKind::Renamed.reads_content());
        assert!(!MonitorEventKind::Deleted.reads_content());
        assert!(MonitorEventKind::DirDeleted.is_removal());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MonitorEventKind::AnalysisComplete).unwrap();
        assert_eq!(json, "\"analysis_complete\"");
        assert_eq!(MonitorEventKind::DirDeleted.to_string(), "dir_deleted");
    }

    #[test]
    fn test_meta_builders() {
        let meta = EventMeta::renamed_from("/old.rs").with_size(10);
        assert_eq!(meta.from, Some(PathBuf::from("/old.rs")));
        assert_eq!(meta.size, Some(10));
        assert_eq!(EventMeta::error("boom").message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_event_omits_empty_optionals() {
        let event = MonitorEvent {
            kind: MonitorEventKind::Deleted,
            path: PathBuf::from("/repo/a.ts"),
            relative_path: PathBuf::from("a.ts"),
            timestamp: 1,
            size: None,
            analysis: None,
            previous_analysis: None,
            previous_path: None,
            message: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("analysis").is_none());
        assert_eq!(json["kind"], "deleted");
    }
}
