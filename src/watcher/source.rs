//! File content access.
//!
//! The monitor never touches the file system directly; it reads through a
//! [`ContentSource`] so embedders and tests can supply content from memory.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Size and timestamps of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMetadata {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// Source of file content and metadata.
pub trait ContentSource: Send + Sync {
    /// Metadata of a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be inspected.
    fn metadata(&self, path: &Path) -> io::Result<ContentMetadata>;

    /// Full content of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentSource;

impl ContentSource for FsContentSource {
    fn metadata(&self, path: &Path) -> io::Result<ContentMetadata> {
        let meta = std::fs::metadata(path)?;
        Ok(ContentMetadata {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            is_dir: meta.is_dir(),
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory file map.
#[derive(Debug, Default)]
pub struct MemoryContentSource {
    files: RwLock<HashMap<PathBuf, MemoryFile>>,
}

impl MemoryContentSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.write().insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified: crate::clock::now(),
            },
        );
    }

    /// Remove a file. Returns true if it existed.
    pub fn remove(&self, path: &Path) -> bool {
        self.files.write().remove(path).is_some()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }
}

impl ContentSource for MemoryContentSource {
    fn metadata(&self, path: &Path) -> io::Result<ContentMetadata> {
        if let Some(file) = self.files.read().get(path) {
            return Ok(ContentMetadata {
                size: file.content.len() as u64,
                modified: Some(file.modified),
                is_dir: false,
            });
        }
        if self.is_dir(path) {
            return Ok(ContentMetadata {
                size: 0,
                modified: None,
                is_dir: true,
            });
        }
        Err(not_found(path))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}
