//! Search query and result types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzer::Language;

/// Default maximum number of results.
pub const DEFAULT_LIMIT: usize = 50;

/// Matching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Term overlap weighted by inverse document frequency.
    #[default]
    FullText,
    /// Literal substring.
    Exact,
    Regex,
    /// Bounded edit distance against the term dictionary.
    Fuzzy,
    /// Symbol, import and export names.
    Semantic,
}

impl SearchMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullText => "full_text",
            Self::Exact => "exact",
            Self::Regex => "regex",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Relevance,
    /// Last-modified time.
    Date,
    Size,
    Complexity,
    Path,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Restrictions applied before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Allowed languages. Empty allows all.
    #[serde(default)]
    pub languages: Vec<Language>,
    /// Path prefixes a document must start with. Empty allows all.
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Path prefixes that exclude a document.
    #[serde(default)]
    pub exclude_paths: Vec<PathBuf>,
    #[serde(default)]
    pub min_complexity: Option<u32>,
    #[serde(default)]
    pub max_complexity: Option<u32>,
}

impl SearchFilters {
    #[must_use]
    pub fn with_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.languages = languages.into_iter().collect();
        self
    }

    #[must_use]
    pub fn include_path(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.include_paths.push(prefix.into());
        self
    }

    #[must_use]
    pub fn exclude_path(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.exclude_paths.push(prefix.into());
        self
    }

    /// Inclusive complexity range.
    #[must_use]
    pub const fn with_complexity(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_complexity = min;
        self.max_complexity = max;
        self
    }

    /// Whether a document passes every filter.
    #[must_use]
    pub fn matches(&self, path: &Path, metadata: &DocumentMetadata) -> bool {
        if !self.languages.is_empty() && !self.languages.contains(&metadata.language) {
            return false;
        }
        if !self.include_paths.is_empty() && !self.include_paths.iter().any(|p| path.starts_with(p))
        {
            return false;
        }
        if self.exclude_paths.iter().any(|p| path.starts_with(p)) {
            return false;
        }
        if self.min_complexity.is_some_and(|min| metadata.complexity < min) {
            return false;
        }
        !self.max_complexity.is_some_and(|max| metadata.complexity > max)
    }
}

/// Result shaping options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    pub limit: usize,
    pub sort_by: SortKey,
    pub order: SortOrder,
    /// Applies to exact, regex and semantic matching.
    pub case_sensitive: bool,
    /// Applies to exact and regex matching.
    pub whole_word: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sort_by: SortKey::Relevance,
            order: SortOrder::Descending,
            case_sensitive: true,
            whole_word: false,
        }
    }
}

impl SearchOptions {
    /// Create new search options with limit.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn sorted_by(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_by = key;
        self.order = order;
        self
    }

    #[must_use]
    pub const fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    #[must_use]
    pub const fn whole_word(mut self) -> Self {
        self.whole_word = true;
        self
    }
}

/// A search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchQuery {
    /// Full-text query with default filters and options.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

/// What a result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    File,
    Symbol,
    Function,
    Class,
    Import,
    Export,
    /// A matching line of content.
    Content,
}

/// Byte range into a result preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
}

/// Snapshot of a document's file metadata, used for filtering and sorting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub language: Language,
    pub size: u64,
    pub lines: usize,
    pub complexity: u32,
    pub last_modified: DateTime<Utc>,
}

/// A ranked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Stable within one index state: path plus location or symbol.
    pub id: String,
    pub path: PathBuf,
    pub kind: ResultKind,
    pub score: f64,
    pub preview: String,
    pub highlights: Vec<Highlight>,
    /// 1-based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based byte column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub metadata: DocumentMetadata,
}

/// A named query kept across index clears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: SearchQuery,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    /// Only changed by execution.
    pub use_count: u64,
}

impl SavedQuery {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>, query: SearchQuery) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            query,
            created_at: crate::clock::now(),
            last_used: None,
            use_count: 0,
        }
    }
}

/// One executed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub mode: SearchMode,
    pub result_count: usize,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}
