//! Directory monitor configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use ignore::gitignore::GitignoreBuilder;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Directories and files ignored unless overridden.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "vendor",
    ".DS_Store",
    "Thumbs.db",
    "*.lock",
    "*-lock.json",
];

/// Default maximum traversal depth below a root.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum size of an analyzed file (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Default debounce window for native watch events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Configuration of a [`DirectoryMonitor`](crate::watcher::DirectoryMonitor).
///
/// Immutable once the monitor is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Watched roots, ordered and unique.
    pub roots: Vec<PathBuf>,

    /// Gitignore-style patterns matched against root-relative paths and
    /// every parent directory.
    pub ignore_patterns: Vec<String>,

    /// Maximum depth of a file below its root (a file directly in the root
    /// has depth 1).
    pub max_depth: usize,

    /// When non-empty, only these extensions are accepted.
    pub include_extensions: Vec<String>,

    /// Extensions that are always rejected. Exclusive with `include_extensions`.
    pub exclude_extensions: Vec<String>,

    /// Files larger than this are tracked but not analyzed.
    pub max_file_size: u64,

    /// Run the analyzer on created and modified files.
    pub analysis_enabled: bool,

    /// Register OS watches on start.
    pub native_watch: bool,

    /// Walk roots on start and emit `Created` for existing files.
    pub initial_scan: bool,

    /// Debounce window for OS watch events.
    pub debounce: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            analysis_enabled: true,
            native_watch: true,
            initial_scan: true,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Normalize an extension: strip a leading dot and lowercase.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

impl MonitorConfig {
    /// Create a configuration for the given roots with default settings.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Replace the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Configuration for embedders that feed events themselves: no OS
    /// watches and no initial scan.
    #[must_use]
    pub fn manual(mut self) -> Self {
        self.native_watch = false;
        self.initial_scan = false;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::config("at least one root is required"));
        }

        let mut seen = HashSet::new();
        for root in &self.roots {
            if root.as_os_str().is_empty() {
                return Err(Error::config("root path cannot be empty"));
            }
            if !seen.insert(root) {
                return Err(Error::config(format!(
                    "duplicate root '{}'",
                    root.display()
                )));
            }
        }

        if !self.include_extensions.is_empty() && !self.exclude_extensions.is_empty() {
            return Err(Error::config(
                "include_extensions and exclude_extensions are mutually exclusive",
            ));
        }

        if self.max_depth == 0 {
            return Err(Error::config("max_depth cannot be 0"));
        }

        if self.max_file_size == 0 {
            return Err(Error::config("max_file_size cannot be 0"));
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in &self.ignore_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| Error::config(format!("invalid ignore pattern '{pattern}': {e}")))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.analysis_enabled);
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert!(config.ignore_patterns.iter().any(|p| p == "node_modules"));
    }

    #[test]
    fn test_new_and_manual() {
        let config = MonitorConfig::new(["/a", "/b"]).manual();
        assert_eq!(config.roots, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(!config.native_watch);
        assert!(!config.initial_scan);
    }

    #[test]
    fn test_validate_no_roots() {
        let config = MonitorConfig {
            roots: Vec::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("root"));
    }

    #[test]
    fn test_validate_duplicate_roots() {
        let config = MonitorConfig::new(["/a", "/a"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_exclusive_extensions() {
        let config = MonitorConfig {
            include_extensions: vec!["ts".to_string()],
            exclude_extensions: vec!["js".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_validate_zero_limits() {
        let config = MonitorConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_depth"));

        let config = MonitorConfig {
            max_file_size: 0,
            ..Default::default()
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("max_file_size"));
    }

    #[test]
    fn test_validate_bad_pattern() {
        let config = MonitorConfig::default().with_ignore_patterns(["src/[a-"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid ignore pattern"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".TS"), "ts");
        assert_eq!(normalize_extension("rs"), "rs");
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = MonitorConfig::new(["/repo"]);
        let json = serde_json::to_string(&config).unwrap();
        let back: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
