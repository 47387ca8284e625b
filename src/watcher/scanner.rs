//! Directory scanner for the initial pass over each root.
//!
//! Walks a root honoring the ignore patterns, extension sets and depth limit,
//! and returns the files the monitor should report as created.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::filter::PathFilter;

/// Result of scanning one root.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted files in walk order.
    pub files: Vec<PathBuf>,
    pub skipped: u64,
    pub errors: u64,
}

/// Walk `root` and collect accepted files.
///
/// Ignored directories are pruned rather than descended into. Entries are
/// visited in file-name order so repeated scans are deterministic.
pub fn scan_root(root: &Path, filter: &PathFilter, max_depth: usize) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    tracing::info!(path = %root.display(), "Starting directory scan");

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !filter.is_ignored(entry.path(), entry.file_type().is_dir())
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                if filter.accepts(entry.path(), false) {
                    outcome.files.push(entry.into_path());
                } else {
                    outcome.skipped += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Error walking directory: {}", e);
                outcome.errors += 1;
            }
        }
    }

    tracing::info!(
        path = %root.display(),
        files = outcome.files.len(),
        skipped = outcome.skipped,
        errors = outcome.errors,
        "Directory scan complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_scan_prunes_ignored_and_filters_extensions() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.ts");
        write(tmp.path(), "src/b.ts");
        write(tmp.path(), "README.md");
        write(tmp.path(), "node_modules/pkg/index.js");

        let config = MonitorConfig {
            exclude_extensions: vec!["md".to_string()],
            ..MonitorConfig::new([tmp.path()]).with_ignore_patterns(["node_modules"])
        };
        let filter = PathFilter::new(&config).unwrap();

        let outcome = scan_root(tmp.path(), &filter, config.max_depth);
        let names: Vec<_> = outcome
            .files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("src/a.ts"), PathBuf::from("src/b.ts")]);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.errors, 0);
    }

    #[test]
    fn test_scan_respects_depth() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "top.rs");
        write(tmp.path(), "a/b/deep.rs");

        let config = MonitorConfig {
            max_depth: 2,
            ..MonitorConfig::new([tmp.path()])
        };
        let filter = PathFilter::new(&config).unwrap();
        let outcome = scan_root(tmp.path(), &filter, config.max_depth);
        assert_eq!(outcome.files, vec![tmp.path().join("top.rs")]);
    }

    #[test]
    fn test_scan_missing_root_counts_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        let config = MonitorConfig::new([&missing]);
        let filter = PathFilter::new(&config).unwrap();
        let outcome = scan_root(&missing, &filter, config.max_depth);
        assert!(outcome.files.is_empty());
        assert_eq!(outcome.errors, 1);
    }
}
