//! Path filtering with gitignore-style patterns.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::{normalize_extension, MonitorConfig};
use crate::Result;

/// Decides which paths the monitor reports and how they are named.
#[derive(Debug)]
pub struct PathFilter {
    roots: Vec<PathBuf>,
    gitignore: Gitignore,
    include: HashSet<String>,
    exclude: HashSet<String>,
    max_depth: usize,
}

impl PathFilter {
    /// Build a filter from monitor configuration.
    ///
    /// Patterns are compiled without a root: callers match root-relative paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in &config.ignore_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| crate::Error::config(format!("invalid pattern: {e}")))?;
        }

        let gitignore = builder
            .build()
            .map_err(|e| crate::Error::config(format!("failed to build gitignore: {e}")))?;

        Ok(Self {
            roots: config.roots.clone(),
            gitignore,
            include: config
                .include_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            exclude: config
                .exclude_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            max_depth: config.max_depth,
        })
    }

    /// Longest configured root containing `path`.
    #[must_use]
    pub fn owning_root(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    /// Path relative to the longest owning root, or the path itself when it
    /// is outside every root.
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        self.owning_root(path)
            .and_then(|root| path.strip_prefix(root).ok())
            .map_or_else(|| path.to_path_buf(), Path::to_path_buf)
    }

    /// Check the path and each of its parent directories against the ignore patterns.
    #[must_use]
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = self.relative_path(path);
        let relative: PathBuf = relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();

        if relative.as_os_str().is_empty() {
            return false;
        }

        if self.gitignore.matched(&relative, is_dir).is_ignore() {
            return true;
        }

        relative
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .any(|parent| self.gitignore.matched(parent, true).is_ignore())
    }

    /// Check the include/exclude extension sets.
    #[must_use]
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize_extension);

        if !self.include.is_empty() {
            return ext.is_some_and(|e| self.include.contains(&e));
        }
        !ext.is_some_and(|e| self.exclude.contains(&e))
    }

    /// Check the depth of a path below its owning root. Paths outside every
    /// root are not depth limited.
    #[must_use]
    pub fn within_depth(&self, path: &Path) -> bool {
        match self.owning_root(path) {
            Some(root) => path
                .strip_prefix(root)
                .map_or(true, |rel| rel.components().count() <= self.max_depth),
            None => true,
        }
    }

    /// Full acceptance check for an event path.
    #[must_use]
    pub fn accepts(&self, path: &Path, is_dir: bool) -> bool {
        if self.is_ignored(path, is_dir) || !self.within_depth(path) {
            return false;
        }
        is_dir || self.accepts_extension(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(config: MonitorConfig) -> PathFilter {
        PathFilter::new(&config).unwrap()
    }

    #[test]
    fn test_relative_path_uses_longest_root() {
        let f = filter(MonitorConfig::new(["/repo", "/repo/packages/web"]));
        assert_eq!(
            f.relative_path(Path::new("/repo/src/a.ts")),
            PathBuf::from("src/a.ts")
        );
        assert_eq!(
            f.relative_path(Path::new("/repo/packages/web/index.ts")),
            PathBuf::from("index.ts")
        );
        assert_eq!(
            f.relative_path(Path::new("/elsewhere/b.ts")),
            PathBuf::from("/elsewhere/b.ts")
        );
    }

    #[test]
    fn test_ignored_parent_directory() {
        let f = filter(MonitorConfig::new(["/repo"]).with_ignore_patterns(["node_modules"]));
        assert!(f.is_ignored(Path::new("/repo/node_modules/x.js"), false));
        assert!(f.is_ignored(Path::new("/repo/a/node_modules/b/c.js"), false));
        assert!(f.is_ignored(Path::new("/repo/node_modules"), true));
        assert!(!f.is_ignored(Path::new("/repo/src/a.ts"), false));
    }

    #[test]
    fn test_glob_and_anchored_patterns() {
        let f = filter(
            MonitorConfig::new(["/repo"]).with_ignore_patterns(["*.log", "/generated", "!keep.log"]),
        );
        assert!(f.is_ignored(Path::new("/repo/out/debug.log"), false));
        assert!(!f.is_ignored(Path::new("/repo/keep.log"), false));
        assert!(f.is_ignored(Path::new("/repo/generated/api.ts"), false));
        assert!(!f.is_ignored(Path::new("/repo/src/generated/api.ts"), false));
    }

    #[test]
    fn test_patterns_apply_outside_roots() {
        let f = filter(MonitorConfig::new(["/repo"]).with_ignore_patterns(["node_modules"]));
        assert!(f.is_ignored(Path::new("/tmp/node_modules/x.js"), false));
    }

    #[test]
    fn test_extension_sets() {
        let include = filter(MonitorConfig {
            include_extensions: vec![".TS".to_string()],
            ..MonitorConfig::new(["/repo"])
        });
        assert!(include.accepts_extension(Path::new("/repo/a.ts")));
        assert!(!include.accepts_extension(Path::new("/repo/a.js")));
        assert!(!include.accepts_extension(Path::new("/repo/Makefile")));

        let exclude = filter(MonitorConfig {
            exclude_extensions: vec!["js".to_string()],
            ..MonitorConfig::new(["/repo"])
        });
        assert!(!exclude.accepts_extension(Path::new("/repo/a.js")));
        assert!(exclude.accepts_extension(Path::new("/repo/a.ts")));
        assert!(exclude.accepts_extension(Path::new("/repo/Makefile")));
    }

    #[test]
    fn test_directories_skip_extension_checks() {
        let f = filter(MonitorConfig {
            include_extensions: vec!["ts".to_string()],
            ..MonitorConfig::new(["/repo"])
        });
        assert!(f.accepts(Path::new("/repo/src"), true));
        assert!(!f.accepts(Path::new("/repo/src"), false));
    }

    #[test]
    fn test_max_depth() {
        let f = filter(MonitorConfig {
            max_depth: 2,
            ..MonitorConfig::new(["/repo"])
        });
        assert!(f.within_depth(Path::new("/repo/a.ts")));
        assert!(f.within_depth(Path::new("/repo/src/a.ts")));
        assert!(!f.within_depth(Path::new("/repo/src/deep/a.ts")));
        assert!(f.within_depth(Path::new("/other/x/y/z/a.ts")));
    }
}
