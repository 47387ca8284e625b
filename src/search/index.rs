//! The inverted index.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::document::{analysis_fingerprint, IndexedDocument};
use super::models::{HistoryEntry, SavedQuery, SearchQuery, SearchResult};
use super::query;
use crate::analyzer::FileAnalysis;
use crate::bounded::BoundedLog;
use crate::error::SearchError;
use crate::observability::spans;
use crate::{clock, metrics, Result};

/// Searches kept in history.
pub const HISTORY_CAPACITY: usize = 100;

/// Documents and postings, always updated together under one lock.
#[derive(Debug, Default)]
pub(crate) struct IndexState {
    pub documents: HashMap<PathBuf, IndexedDocument>,
    /// Term to the documents containing it. Ordered for prefix lookups.
    pub postings: BTreeMap<String, HashSet<PathBuf>>,
}

impl IndexState {
    fn insert(&mut self, doc: IndexedDocument) {
        self.remove(&doc.path.clone());
        for term in doc.terms.keys() {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(doc.path.clone());
        }
        self.documents.insert(doc.path.clone(), doc);
    }

    fn remove(&mut self, path: &Path) -> bool {
        let Some(old) = self.documents.remove(path) else {
            return false;
        };
        for term in old.terms.keys() {
            if let Some(paths) = self.postings.get_mut(term) {
                paths.remove(path);
                if paths.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        true
    }
}

/// Multi-mode search over indexed files.
///
/// Readers never observe a partially replaced document: a document and its
/// postings change under the same write lock.
#[derive(Debug)]
pub struct SearchIndex {
    state: RwLock<IndexState>,
    history: Mutex<BoundedLog<HistoryEntry>>,
    saved: RwLock<HashMap<Uuid, SavedQuery>>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            history: Mutex::new(BoundedLog::new(HISTORY_CAPACITY)),
            saved: RwLock::new(HashMap::new()),
        }
    }

    /// Index or re-index a file, replacing any previous version.
    ///
    /// Returns false when neither the content nor the analysis changed and
    /// re-tokenizing was skipped. Content alone without an analysis never
    /// replaces an analyzed document of the same content.
    pub fn index_file(&self, path: &Path, content: &str, analysis: Option<&FileAnalysis>) -> bool {
        let hash = blake3::hash(content.as_bytes());
        {
            let state = self.state.read();
            if let Some(existing) = state.documents.get(path) {
                let same_analysis = match analysis {
                    None => true,
                    Some(analysis) => existing.analysis == Some(analysis_fingerprint(analysis)),
                };
                if existing.hash == hash && same_analysis {
                    tracing::trace!(path = %path.display(), "Content unchanged, skipping");
                    return false;
                }
            }
        }

        let doc = IndexedDocument::build(path, content, analysis, hash);
        let terms = doc.terms.len();

        let documents = {
            let mut state = self.state.write();
            state.insert(doc);
            state.documents.len()
        };
        set_document_gauge(documents);

        tracing::debug!(path = %path.display(), terms, "Indexed file");
        true
    }

    /// Remove a file. Returns false if it was not indexed.
    pub fn remove_file(&self, path: &Path) -> bool {
        let (removed, documents) = {
            let mut state = self.state.write();
            (state.remove(path), state.documents.len())
        };
        if removed {
            set_document_gauge(documents);
            tracing::debug!(path = %path.display(), "Removed file from index");
        }
        removed
    }

    /// Remove every file under a directory. Returns the number removed.
    pub fn remove_prefix(&self, dir: &Path) -> usize {
        let (removed, documents) = {
            let mut state = self.state.write();
            let paths: Vec<PathBuf> = state
                .documents
                .keys()
                .filter(|p| p.starts_with(dir))
                .cloned()
                .collect();
            let removed = paths.iter().filter(|p| state.remove(p)).count();
            (removed, state.documents.len())
        };
        if removed > 0 {
            set_document_gauge(documents);
        }
        removed
    }

    /// Run a query and record it in history.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if a regex query does not compile.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let span = spans::search_span(query.mode.as_str(), &query.text);
        let _enter = span.enter();
        let started = Instant::now();

        let results = {
            let state = self.state.read();
            query::execute(&state, query)?
        };

        let elapsed = started.elapsed();
        metrics::SEARCH_LATENCY
            .with_label_values(&[query.mode.as_str()])
            .observe(elapsed.as_secs_f64());

        self.history.lock().push(HistoryEntry {
            query: query.text.clone(),
            mode: query.mode,
            result_count: results.len(),
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            timestamp: clock::now(),
        });

        tracing::debug!(
            mode = %query.mode,
            results = results.len(),
            elapsed_ms = elapsed.as_millis(),
            "Search complete"
        );
        Ok(results)
    }

    /// Completions for a prefix: history queries first (most recent first),
    /// then dictionary terms by document frequency.
    #[must_use]
    pub fn get_suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        let mut suggestions: Vec<String> = Vec::new();
        let push = |candidate: &str, out: &mut Vec<String>| {
            if out.len() < limit && !out.iter().any(|s| s == candidate) {
                out.push(candidate.to_string());
            }
        };

        for entry in self.history.lock().newest_first() {
            if entry.query.to_lowercase().starts_with(&prefix) {
                push(&entry.query, &mut suggestions);
            }
        }

        if suggestions.len() < limit {
            let state = self.state.read();
            let mut terms: Vec<(&String, usize)> = state
                .postings
                .range(prefix.clone()..)
                .take_while(|(term, _)| term.starts_with(&prefix))
                .map(|(term, paths)| (term, paths.len()))
                .collect();
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (term, _) in terms {
                push(term, &mut suggestions);
            }
        }

        suggestions
    }

    /// Store a named query.
    pub fn save_query(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        query: SearchQuery,
    ) -> SavedQuery {
        let saved = SavedQuery::new(name, description, query);
        self.saved.write().insert(saved.id, saved.clone());
        tracing::info!(id = %saved.id, name = %saved.name, "Saved query");
        saved
    }

    /// Saved queries, oldest first.
    #[must_use]
    pub fn get_saved_queries(&self) -> Vec<SavedQuery> {
        let mut queries: Vec<SavedQuery> = self.saved.read().values().cloned().collect();
        queries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        queries
    }

    /// A saved query by id.
    #[must_use]
    pub fn get_saved_query(&self, id: Uuid) -> Option<SavedQuery> {
        self.saved.read().get(&id).cloned()
    }

    /// Run a saved query, counting the use and stamping `last_used`.
    ///
    /// # Errors
    ///
    /// Returns `SavedQueryNotFound` for an unknown id, or the search error.
    pub fn execute_saved_query(&self, id: Uuid) -> Result<Vec<SearchResult>> {
        let query = {
            let mut saved = self.saved.write();
            let entry = saved
                .get_mut(&id)
                .ok_or_else(|| SearchError::SavedQueryNotFound(id.to_string()))?;
            entry.use_count += 1;
            entry.last_used = Some(clock::now());
            entry.query.clone()
        };
        self.search(&query)
    }

    /// Delete a saved query.
    ///
    /// # Errors
    ///
    /// Returns `SavedQueryNotFound` for an unknown id.
    pub fn delete_saved_query(&self, id: Uuid) -> Result<SavedQuery> {
        self.saved
            .write()
            .remove(&id)
            .ok_or_else(|| SearchError::SavedQueryNotFound(id.to_string()).into())
    }

    /// Most recent searches first.
    #[must_use]
    pub fn get_search_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .newest_first()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drop all documents and history. Saved queries are kept.
    pub fn clear_index(&self) {
        {
            let mut state = self.state.write();
            state.documents.clear();
            state.postings.clear();
        }
        self.history.lock().clear();
        set_document_gauge(0);
        tracing::info!("Search index cleared");
    }

    /// Files currently indexed.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Distinct terms in the dictionary.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.state.read().postings.len()
    }

    /// Whether a file is indexed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.state.read().documents.contains_key(path)
    }
}

fn set_document_gauge(documents: usize) {
    metrics::DOCUMENTS_INDEXED.set(i64::try_from(documents).unwrap_or(i64::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{FileAnalyzer, Language};
    use crate::search::models::{
        ResultKind, SearchFilters, SearchMode, SearchOptions, SortKey, SortOrder,
    };
    use crate::Error;

    fn index_with(files: &[(&str, &str)]) -> SearchIndex {
        let index = SearchIndex::new();
        for (path, content) in files {
            index.index_file(Path::new(path), content, None);
        }
        index
    }

    fn paths(results: &[SearchResult]) -> Vec<String> {
        results
            .iter()
            .map(|r| r.path.display().to_string())
            .collect()
    }

    #[test]
    fn test_full_text_matches_identifier_parts() {
        let index = index_with(&[
            ("/a.ts", "export function calculateSum(a, b) { return a + b; }"),
            ("/b.ts", "export function calculateProduct(a, b) { return a * b; }"),
        ]);
        let results = index.search(&SearchQuery::new("calculate")).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score > 0.0));
        assert!(results.iter().all(|r| r.kind == ResultKind::File));
    }

    #[test]
    fn test_more_distinct_terms_rank_higher() {
        let index = index_with(&[
            ("/one.rs", "parse parse parse parse parse parse parse"),
            ("/two.rs", "parse config"),
        ]);
        let results = index.search(&SearchQuery::new("parse config")).unwrap();
        assert_eq!(paths(&results), vec!["/two.rs", "/one.rs"]);
    }

    #[test]
    fn test_reindex_retires_old_terms() {
        let index = index_with(&[("/p.ts", "const oldName = 1;")]);
        index.index_file(Path::new("/p.ts"), "const newName = 1;", None);

        assert!(index.search(&SearchQuery::new("oldName")).unwrap().is_empty());
        let results = index.search(&SearchQuery::new("newName")).unwrap();
        assert_eq!(paths(&results), vec!["/p.ts"]);
        assert_eq!(index.document_count(), 1);
    }

    #[test]
    fn test_unchanged_content_is_skipped() {
        let index = SearchIndex::new();
        assert!(index.index_file(Path::new("/a.rs"), "fn a() {}", None));
        assert!(!index.index_file(Path::new("/a.rs"), "fn a() {}", None));

        let analysis = FileAnalyzer::new().analyze_file(Path::new("/a.rs"), b"fn a() {}");
        assert!(index.index_file(Path::new("/a.rs"), "fn a() {}", Some(&analysis)));
        assert!(!index.index_file(Path::new("/a.rs"), "fn a() {}", None));
        assert!(!index.index_file(Path::new("/a.rs"), "fn a() {}", Some(&analysis)));
    }

    #[test]
    fn test_new_analysis_replaces_stale_one_for_same_content() {
        let index = SearchIndex::new();
        let path = Path::new("/repo/live.ts");
        let analyzer = FileAnalyzer::new();
        let old_content = "function oldOne() {}\n";
        let new_content = "function newOne() {\n  if (ready) { go(); }\n}\n";
        let stale = analyzer.analyze_file(path, old_content.as_bytes());
        let fresh = analyzer.analyze_file(path, new_content.as_bytes());

        // Content read after a later edit, paired with the earlier analysis.
        assert!(index.index_file(path, new_content, Some(&stale)));
        assert!(index.index_file(path, new_content, Some(&fresh)));

        let semantic = |text: &str| {
            index
                .search(&SearchQuery::new(text).with_mode(SearchMode::Semantic))
                .unwrap()
        };
        assert!(semantic("oldOne").is_empty());
        let results = semantic("newOne");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.complexity, fresh.complexity);
    }

    #[test]
    fn test_concurrent_reindex_never_mixes_versions() {
        let index = SearchIndex::new();
        let path = Path::new("/repo/flip.ts");
        let first = "const alphaValue = 1;";
        let second = "const betaValue = 2;";
        index.index_file(path, first, None);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..500 {
                    let content = if i % 2 == 0 { second } else { first };
                    index.index_file(path, content, None);
                }
            });
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        for result in index.search(&SearchQuery::new("value")).unwrap() {
                            assert!(result.preview == first || result.preview == second);
                        }
                        for result in index.search(&SearchQuery::new("alpha")).unwrap() {
                            assert_eq!(result.preview, first);
                        }
                        for result in index.search(&SearchQuery::new("beta")).unwrap() {
                            assert_eq!(result.preview, second);
                        }
                    }
                });
            }
        });

        assert_eq!(index.document_count(), 1);
    }

    #[test]
    fn test_exact_case_and_whole_word() {
        let index = index_with(&[
            ("/a.py", "# TODO: fix\nx = 1\n# todo later\n"),
            ("/b.py", "TODOS = []\n"),
        ]);

        let results = index
            .search(&SearchQuery::new("TODO").with_mode(SearchMode::Exact))
            .unwrap();
        assert_eq!(results.len(), 2);

        let whole = index
            .search(
                &SearchQuery::new("TODO")
                    .with_mode(SearchMode::Exact)
                    .with_options(SearchOptions::default().whole_word()),
            )
            .unwrap();
        assert_eq!(paths(&whole), vec!["/a.py"]);
        assert_eq!(whole[0].line, Some(1));
        assert_eq!(whole[0].column, Some(3));
        assert_eq!(whole[0].preview, "# TODO: fix");
        assert_eq!(whole[0].highlights[0].start, 2);

        let insensitive = index
            .search(
                &SearchQuery::new("todo")
                    .with_mode(SearchMode::Exact)
                    .with_options(SearchOptions::default().case_insensitive().whole_word()),
            )
            .unwrap();
        assert_eq!(insensitive.len(), 1);
        assert!((insensitive[0].score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_regex_mode() {
        let index = index_with(&[("/a.rs", "fn one() {}\nfn two() {}\n"), ("/b.rs", "struct X;")]);
        let results = index
            .search(&SearchQuery::new(r"fn \w+\(").with_mode(SearchMode::Regex))
            .unwrap();
        assert_eq!(paths(&results), vec!["/a.rs"]);
        assert!((results[0].score - 2.0).abs() < f64::EPSILON);

        let err = index
            .search(&SearchQuery::new("(").with_mode(SearchMode::Regex))
            .unwrap_err();
        assert!(matches!(err, Error::Search(SearchError::InvalidQuery(_))));
        assert!(index
            .search(&SearchQuery::new("fn").with_mode(SearchMode::FullText))
            .is_ok());
    }

    #[test]
    fn test_fuzzy_mode_bounds_distance() {
        let index = index_with(&[
            ("/a.ts", "function calculate() {}"),
            ("/b.ts", "function calibrate() {}"),
            ("/c.ts", "let cat = 1;"),
        ]);
        let results = index
            .search(&SearchQuery::new("calculat").with_mode(SearchMode::Fuzzy))
            .unwrap();
        assert_eq!(paths(&results), vec!["/a.ts"]);

        // Short terms allow a single edit.
        let results = index
            .search(&SearchQuery::new("cot").with_mode(SearchMode::Fuzzy))
            .unwrap();
        assert_eq!(paths(&results), vec!["/c.ts"]);
        let results = index
            .search(&SearchQuery::new("dot").with_mode(SearchMode::Fuzzy))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_semantic_mode_returns_structural_kinds() {
        let index = SearchIndex::new();
        let content = "import { Router } from 'express';\nexport class UserService {\n  findUser(id) {}\n}\nexport function createUser(name) {}\n";
        let path = Path::new("/svc.ts");
        let analysis = FileAnalyzer::new().analyze_file(path, content.as_bytes());
        index.index_file(path, content, Some(&analysis));

        let results = index
            .search(
                &SearchQuery::new("user")
                    .with_mode(SearchMode::Semantic)
                    .with_options(SearchOptions::default().case_insensitive()),
            )
            .unwrap();
        let kinds: Vec<_> = results.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&ResultKind::Class));
        assert!(kinds.contains(&ResultKind::Function));
        assert!(results.iter().all(|r| r.line.is_some()));

        let imports = index
            .search(&SearchQuery::new("express").with_mode(SearchMode::Semantic))
            .unwrap();
        assert_eq!(imports[0].kind, ResultKind::Import);
        assert!((imports[0].score - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_limit_filters_and_sorting() {
        let index = SearchIndex::new();
        for (i, name) in ["c", "a", "b"].iter().enumerate() {
            let path = format!("/repo/{name}.rs");
            let body = "fn handler() {}\n".repeat(i + 1);
            let analysis = FileAnalyzer::new().analyze_file(Path::new(&path), body.as_bytes());
            index.index_file(Path::new(&path), &body, Some(&analysis));
        }
        index.index_file(Path::new("/repo/x.py"), "def handler(): pass", None);

        let limited = index
            .search(&SearchQuery::new("handler").with_options(SearchOptions::new(2)))
            .unwrap();
        assert_eq!(limited.len(), 2);

        let by_path = index
            .search(
                &SearchQuery::new("handler")
                    .with_filters(SearchFilters::default().with_languages([Language::Rust]))
                    .with_options(SearchOptions::default().sorted_by(SortKey::Path, SortOrder::Ascending)),
            )
            .unwrap();
        assert_eq!(paths(&by_path), vec!["/repo/a.rs", "/repo/b.rs", "/repo/c.rs"]);

        let by_size = index
            .search(
                &SearchQuery::new("handler")
                    .with_filters(SearchFilters::default().exclude_path("/repo/x.py"))
                    .with_options(SearchOptions::default().sorted_by(SortKey::Size, SortOrder::Descending)),
            )
            .unwrap();
        assert_eq!(paths(&by_size), vec!["/repo/b.rs", "/repo/a.rs", "/repo/c.rs"]);
    }

    #[test]
    fn test_saved_queries() {
        let index = index_with(&[("/a.rs", "// TODO: remove")]);
        let saved = index.save_query("daily", None, SearchQuery::new("TODO"));
        assert_eq!(saved.use_count, 0);

        index.execute_saved_query(saved.id).unwrap();
        let results = index.execute_saved_query(saved.id).unwrap();
        assert_eq!(results.len(), 1);

        let stored = index.get_saved_query(saved.id).unwrap();
        assert_eq!(stored.use_count, 2);
        assert!(stored.last_used.is_some());
        assert_eq!(index.get_saved_queries().len(), 1);

        let unknown = Uuid::new_v4();
        assert!(matches!(
            index.execute_saved_query(unknown),
            Err(Error::Search(SearchError::SavedQueryNotFound(_)))
        ));

        index.delete_saved_query(saved.id).unwrap();
        assert!(matches!(
            index.delete_saved_query(saved.id),
            Err(Error::Search(SearchError::SavedQueryNotFound(_)))
        ));
    }

    #[test]
    fn test_history_and_suggestions() {
        let index = index_with(&[
            ("/a.ts", "const config = loadConfig(); const configPath = '';"),
            ("/b.ts", "const config = {};"),
        ]);
        index.search(&SearchQuery::new("conf loader")).unwrap();
        index.search(&SearchQuery::new("missing")).unwrap();

        let history = index.get_search_history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "missing");
        assert_eq!(history[1].result_count, 0);

        let suggestions = index.get_suggestions("conf", 3);
        assert_eq!(suggestions, vec!["conf loader", "config", "configpath"]);
    }

    #[test]
    fn test_history_is_capped() {
        let index = SearchIndex::new();
        for i in 0..150 {
            index.search(&SearchQuery::new(format!("q{i}"))).unwrap();
        }
        let history = index.get_search_history(usize::MAX);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].query, "q149");
    }

    #[test]
    fn test_clear_keeps_saved_queries() {
        let index = index_with(&[("/a.rs", "fn main() {}")]);
        index.save_query("mains", Some("entry points".to_string()), SearchQuery::new("main"));
        index.search(&SearchQuery::new("main")).unwrap();

        index.clear_index();
        assert_eq!(index.document_count(), 0);
        assert_eq!(index.term_count(), 0);
        assert!(index.get_search_history(10).is_empty());
        assert_eq!(index.get_saved_queries().len(), 1);
    }

    #[test]
    fn test_remove_prefix() {
        let index = index_with(&[
            ("/repo/src/a.rs", "fn a() {}"),
            ("/repo/src/b.rs", "fn b() {}"),
            ("/repo/main.rs", "fn main() {}"),
        ]);
        assert_eq!(index.remove_prefix(Path::new("/repo/src")), 2);
        assert!(index.contains(Path::new("/repo/main.rs")));
        assert!(!index.remove_file(Path::new("/repo/src/a.rs")));
        assert_eq!(index.search(&SearchQuery::new("fn")).unwrap().len(), 1);
    }
}
