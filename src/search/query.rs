//! Query execution over a consistent view of the index.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use super::document::{truncate_at_boundary, IndexedDocument, PREVIEW_LEN};
use super::index::IndexState;
use super::models::{
    Highlight, ResultKind, SearchMode, SearchOptions, SearchQuery, SearchResult, SortKey,
    SortOrder,
};
use super::tokenize::{is_word_char, query_terms};
use crate::error::SearchError;
use crate::Result;

/// Query terms considered by fuzzy matching.
pub const MAX_FUZZY_TERMS: usize = 8;

/// Matches counted per document in exact and regex modes.
pub const MAX_MATCHES_PER_DOCUMENT: usize = 1000;

/// Compiled program and lazy DFA size limit for regex queries.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

const MAX_HIGHLIGHTS: usize = 32;

/// Run a query. Filters are applied before scoring; results are sorted and
/// truncated to the limit.
pub(crate) fn execute(state: &IndexState, query: &SearchQuery) -> Result<Vec<SearchResult>> {
    if query.text.trim().is_empty() || query.options.limit == 0 {
        return Ok(Vec::new());
    }

    let candidates = state
        .documents
        .values()
        .filter(|doc| query.filters.matches(&doc.path, &doc.metadata));

    let mut results = match query.mode {
        SearchMode::FullText => full_text_matches(state, candidates, &query.text),
        SearchMode::Exact => exact_matches(candidates, &query.text, &query.options),
        SearchMode::Regex => {
            let re = compile_regex(&query.text, &query.options)?;
            regex_matches(candidates, &re)
        }
        SearchMode::Fuzzy => fuzzy_matches(state, candidates, &query.text),
        SearchMode::Semantic => semantic_matches(candidates, query.text.trim(), &query.options),
    };

    sort_results(&mut results, &query.options);
    results.truncate(query.options.limit);
    Ok(results)
}

fn compile_regex(text: &str, options: &SearchOptions) -> Result<Regex> {
    let pattern = if options.whole_word {
        format!(r"\b(?:{text})\b")
    } else {
        text.to_string()
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| SearchError::InvalidQuery(e.to_string()).into())
}

/// Score: distinct matched terms plus a bounded tf-idf fraction, so a document
/// matching more distinct terms always outranks one matching fewer.
#[allow(clippy::cast_precision_loss)]
fn full_text_matches<'a>(
    state: &IndexState,
    candidates: impl Iterator<Item = &'a IndexedDocument>,
    text: &str,
) -> Vec<SearchResult> {
    let total = state.documents.len() as f64;
    let weighted: Vec<(String, f64)> = query_terms(text)
        .into_iter()
        .filter_map(|term| {
            let df = state.postings.get(&term)?.len() as f64;
            Some((term, (1.0 + total / df).ln()))
        })
        .collect();
    if weighted.is_empty() {
        return Vec::new();
    }

    candidates
        .filter_map(|doc| {
            let mut matched = 0usize;
            let mut tfidf = 0.0;
            let mut hits = Vec::new();
            for (term, idf) in &weighted {
                if let Some(tf) = doc.terms.get(term) {
                    matched += 1;
                    tfidf += f64::from(*tf) * idf;
                    hits.push(term.as_str());
                }
            }
            (matched > 0).then(|| file_result(doc, matched as f64 + tfidf / (1.0 + tfidf), &hits))
        })
        .collect()
}

/// Case folding for exact matching is ASCII-only so byte offsets stay valid.
#[allow(clippy::cast_precision_loss)]
fn exact_matches<'a>(
    candidates: impl Iterator<Item = &'a IndexedDocument>,
    needle: &str,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    let needle: Cow<'_, str> = if options.case_sensitive {
        Cow::Borrowed(needle)
    } else {
        Cow::Owned(needle.to_ascii_lowercase())
    };

    candidates
        .filter_map(|doc| {
            let haystack: Cow<'_, str> = if options.case_sensitive {
                Cow::Borrowed(doc.content.as_str())
            } else {
                Cow::Owned(doc.content.to_ascii_lowercase())
            };
            let ranges: Vec<(usize, usize)> = haystack
                .match_indices(needle.as_ref())
                .map(|(start, m)| (start, start + m.len()))
                .filter(|&(start, end)| !options.whole_word || is_whole_word(&haystack, start, end))
                .take(MAX_MATCHES_PER_DOCUMENT)
                .collect();
            if ranges.is_empty() {
                return None;
            }
            Some(line_result(doc, ranges.len() as f64, &ranges))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn regex_matches<'a>(
    candidates: impl Iterator<Item = &'a IndexedDocument>,
    re: &Regex,
) -> Vec<SearchResult> {
    candidates
        .filter_map(|doc| {
            let ranges: Vec<(usize, usize)> = re
                .find_iter(&doc.content)
                .filter(|m| !m.is_empty())
                .take(MAX_MATCHES_PER_DOCUMENT)
                .map(|m| (m.start(), m.end()))
                .collect();
            if ranges.is_empty() {
                return None;
            }
            Some(line_result(doc, ranges.len() as f64, &ranges))
        })
        .collect()
}

/// Maximum edit distance for a query term.
fn max_distance(term: &str) -> usize {
    if term.chars().count() < 4 {
        1
    } else {
        2
    }
}

#[allow(clippy::cast_precision_loss)]
fn fuzzy_matches<'a>(
    state: &'a IndexState,
    candidates: impl Iterator<Item = &'a IndexedDocument>,
    text: &str,
) -> Vec<SearchResult> {
    // Each query term expands to the dictionary terms within reach, weighted by closeness.
    let expansions: Vec<Vec<(&str, f64)>> = query_terms(text)
        .iter()
        .take(MAX_FUZZY_TERMS)
        .map(|query_term| {
            let max = max_distance(query_term);
            let len = query_term.chars().count();
            state
                .postings
                .keys()
                .filter(|term| term.chars().count().abs_diff(len) <= max)
                .filter_map(|term| {
                    let distance = strsim::levenshtein(query_term, term);
                    (distance <= max).then(|| (term.as_str(), 1.0 / (1.0 + distance as f64)))
                })
                .collect()
        })
        .collect();

    candidates
        .filter_map(|doc| {
            let mut score = 0.0;
            let mut hits = Vec::new();
            for expansion in &expansions {
                let best = expansion
                    .iter()
                    .filter(|(term, _)| doc.terms.contains_key(*term))
                    .max_by(|a, b| a.1.total_cmp(&b.1));
                if let Some((term, similarity)) = best {
                    score += similarity;
                    hits.push(*term);
                }
            }
            (score > 0.0).then(|| file_result(doc, score, &hits))
        })
        .collect()
}

/// Exact name match scores 3, prefix 2, substring 1.
fn semantic_matches<'a>(
    candidates: impl Iterator<Item = &'a IndexedDocument>,
    text: &str,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    let fold = |s: &str| {
        if options.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let needle = fold(text);

    let mut results = Vec::new();
    for doc in candidates {
        for entry in &doc.structure {
            let name = fold(&entry.name);
            let score = if name == needle {
                3.0
            } else if name.starts_with(&needle) {
                2.0
            } else if name.contains(&needle) {
                1.0
            } else {
                continue;
            };

            let preview = truncate_at_boundary(&entry.detail, PREVIEW_LEN).to_string();
            let highlights = find_highlights(&preview, &[text], !options.case_sensitive);
            results.push(SearchResult {
                id: format!(
                    "{}#{}:{}:{}",
                    doc.path.display(),
                    kind_label(entry.kind),
                    entry.name,
                    entry.line
                ),
                path: doc.path.clone(),
                kind: entry.kind,
                score,
                preview,
                highlights,
                line: Some(entry.line),
                column: None,
                metadata: doc.metadata.clone(),
            });
        }
    }
    results
}

const fn kind_label(kind: ResultKind) -> &'static str {
    match kind {
        ResultKind::File => "file",
        ResultKind::Symbol => "symbol",
        ResultKind::Function => "function",
        ResultKind::Class => "class",
        ResultKind::Import => "import",
        ResultKind::Export => "export",
        ResultKind::Content => "content",
    }
}

fn file_result(doc: &IndexedDocument, score: f64, terms: &[&str]) -> SearchResult {
    SearchResult {
        id: doc.path.display().to_string(),
        path: doc.path.clone(),
        kind: ResultKind::File,
        score,
        preview: doc.preview.clone(),
        highlights: find_highlights(&doc.preview, terms, true),
        line: None,
        column: None,
        metadata: doc.metadata.clone(),
    }
}

/// Result for the line of the first match, highlighting every match on it.
fn line_result(doc: &IndexedDocument, score: f64, ranges: &[(usize, usize)]) -> SearchResult {
    let content = doc.content.as_str();
    let (first, _) = ranges[0];
    let line_start = content[..first].rfind('\n').map_or(0, |i| i + 1);
    let line_end = content[first..]
        .find('\n')
        .map_or(content.len(), |i| first + i);
    let line = content[..first].matches('\n').count() + 1;
    let column = first - line_start + 1;

    let preview = truncate_at_boundary(content[line_start..line_end].trim_end_matches('\r'), PREVIEW_LEN);
    let preview_end = line_start + preview.len();
    let highlights = ranges
        .iter()
        .filter(|&&(start, end)| start >= line_start && end <= preview_end)
        .take(MAX_HIGHLIGHTS)
        .map(|&(start, end)| Highlight {
            start: start - line_start,
            end: end - line_start,
        })
        .collect();

    SearchResult {
        id: format!("{}:{line}:{column}", doc.path.display()),
        path: doc.path.clone(),
        kind: ResultKind::Content,
        score,
        preview: preview.to_string(),
        highlights,
        line: Some(line),
        column: Some(column),
        metadata: doc.metadata.clone(),
    }
}

/// Byte ranges of each needle in `text`, merged and sorted.
fn find_highlights(text: &str, needles: &[&str], ignore_case: bool) -> Vec<Highlight> {
    let haystack: Cow<'_, str> = if ignore_case {
        Cow::Owned(text.to_ascii_lowercase())
    } else {
        Cow::Borrowed(text)
    };

    let mut spans: Vec<Highlight> = Vec::new();
    for needle in needles.iter().filter(|n| !n.is_empty()) {
        let needle: Cow<'_, str> = if ignore_case {
            Cow::Owned(needle.to_ascii_lowercase())
        } else {
            Cow::Borrowed(needle)
        };
        spans.extend(
            haystack
                .match_indices(needle.as_ref())
                .map(|(start, m)| Highlight {
                    start,
                    end: start + m.len(),
                }),
        );
    }
    spans.sort_unstable();

    let mut merged: Vec<Highlight> = Vec::new();
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged.truncate(MAX_HIGHLIGHTS);
    merged
}

fn is_whole_word(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Order by the requested key; relevance then path break ties.
fn sort_results(results: &mut [SearchResult], options: &SearchOptions) {
    results.sort_by(|a, b| {
        let primary = match options.sort_by {
            SortKey::Relevance => a.score.total_cmp(&b.score),
            SortKey::Date => a.metadata.last_modified.cmp(&b.metadata.last_modified),
            SortKey::Size => a.metadata.size.cmp(&b.metadata.size),
            SortKey::Complexity => a.metadata.complexity.cmp(&b.metadata.complexity),
            SortKey::Path => a.path.cmp(&b.path),
        };
        let primary = match options.order {
            SortOrder::Ascending => primary,
            SortOrder::Descending => primary.reverse(),
        };
        primary
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_highlights_merges_overlaps() {
        let spans = find_highlights("calculateSum(sum)", &["calculatesum", "sum"], true);
        assert_eq!(
            spans,
            vec![
                Highlight { start: 0, end: 12 },
                Highlight { start: 13, end: 16 }
            ]
        );
    }

    #[test]
    fn test_whole_word_boundaries() {
        let text = "count counter recount";
        assert!(is_whole_word(text, 0, 5));
        assert!(!is_whole_word(text, 6, 11));
        assert!(!is_whole_word(text, 16, 21));
    }

    #[test]
    fn test_fuzzy_distance_threshold() {
        assert_eq!(max_distance("abc"), 1);
        assert_eq!(max_distance("abcd"), 2);
    }

    #[test]
    fn test_invalid_regex_is_invalid_query() {
        let err = compile_regex("(unclosed", &SearchOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Search(SearchError::InvalidQuery(_))
        ));
    }
}
