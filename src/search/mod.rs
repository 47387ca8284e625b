//! Multi-mode code search.
//!
//! This module provides:
//! - An inverted index with identifier-aware tokenization
//! - Full-text, exact, regex, fuzzy and semantic query modes
//! - Saved queries, search history and suggestions

mod document;
mod index;
mod models;
mod query;
mod tokenize;

pub use document::PREVIEW_LEN;
pub use index::{SearchIndex, HISTORY_CAPACITY};
pub use models::{
    DocumentMetadata, Highlight, HistoryEntry, ResultKind, SavedQuery, SearchFilters, SearchMode,
    SearchOptions, SearchQuery, SearchResult, SortKey, SortOrder, DEFAULT_LIMIT,
};
pub use query::{MAX_FUZZY_TERMS, MAX_MATCHES_PER_DOCUMENT};
pub use tokenize::{query_terms, split_identifier, tokenize, MIN_TOKEN_LEN};
