//! Indexed documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::models::{DocumentMetadata, ResultKind};
use super::tokenize::tokenize;
use crate::analyzer::{FileAnalysis, Language, SymbolKind};

/// Maximum preview length in bytes.
pub const PREVIEW_LEN: usize = 200;
const PREVIEW_LINES: usize = 5;

/// A symbol, import or export searchable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StructuralEntry {
    pub kind: ResultKind,
    pub name: String,
    pub line: usize,
    /// Short rendering used as the result preview.
    pub detail: String,
}

/// One file in the index. Replaced wholesale on re-index.
#[derive(Debug, Clone)]
pub(crate) struct IndexedDocument {
    pub path: PathBuf,
    pub terms: HashMap<String, u32>,
    pub content: String,
    pub preview: String,
    pub metadata: DocumentMetadata,
    pub structure: Vec<StructuralEntry>,
    pub hash: blake3::Hash,
    /// Fingerprint of the analysis the document was built from, if any.
    pub analysis: Option<blake3::Hash>,
}

impl IndexedDocument {
    pub fn build(
        path: &Path,
        content: &str,
        analysis: Option<&FileAnalysis>,
        hash: blake3::Hash,
    ) -> Self {
        let mut terms: HashMap<String, u32> = HashMap::new();
        for token in tokenize(content) {
            *terms.entry(token).or_insert(0) += 1;
        }

        let (metadata, structure) = match analysis {
            Some(analysis) => {
                for name in analysis_names(analysis) {
                    for token in tokenize(name) {
                        *terms.entry(token).or_insert(0) += 1;
                    }
                }
                (
                    DocumentMetadata {
                        language: analysis.language,
                        size: analysis.size,
                        lines: analysis.lines,
                        complexity: analysis.complexity,
                        last_modified: analysis.last_modified,
                    },
                    structure_of(analysis),
                )
            }
            None => (
                DocumentMetadata {
                    language: Language::from_path(path),
                    size: content.len() as u64,
                    lines: content.lines().filter(|l| !l.trim().is_empty()).count(),
                    complexity: 1,
                    last_modified: crate::clock::now(),
                },
                Vec::new(),
            ),
        };

        Self {
            path: path.to_path_buf(),
            terms,
            content: content.to_string(),
            preview: preview_of(content),
            metadata,
            structure,
            hash,
            analysis: analysis.map(analysis_fingerprint),
        }
    }
}

/// Digest of everything an analysis contributes to a document.
///
/// Two analyses with the same fingerprint produce the same structure and
/// metadata, so a re-index with identical content can be skipped.
pub fn analysis_fingerprint(analysis: &FileAnalysis) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    let mut field = |bytes: &[u8]| {
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };

    field(analysis.language.as_str().as_bytes());
    field(&analysis.size.to_le_bytes());
    field(&(analysis.lines as u64).to_le_bytes());
    field(&analysis.complexity.to_le_bytes());
    field(&analysis.last_modified.timestamp_millis().to_le_bytes());
    for symbol in &analysis.symbols {
        field(symbol.name.as_bytes());
        field(&(symbol.line as u64).to_le_bytes());
    }
    for function in analysis.all_functions() {
        field(function.name.as_bytes());
        field(&(function.line as u64).to_le_bytes());
        field(function.params.join(",").as_bytes());
    }
    for class in &analysis.classes {
        field(class.name.as_bytes());
        field(&(class.line as u64).to_le_bytes());
    }
    for import in &analysis.imports {
        field(import.module.as_bytes());
        field(import.specifiers.join(",").as_bytes());
        field(&(import.line as u64).to_le_bytes());
    }
    for export in &analysis.exports {
        field(export.name.as_bytes());
        field(export.source.as_deref().unwrap_or_default().as_bytes());
        field(&(export.line as u64).to_le_bytes());
    }
    hasher.finalize()
}

/// Names contributed by an analysis in addition to the raw content.
fn analysis_names(analysis: &FileAnalysis) -> impl Iterator<Item = &str> {
    let symbols = analysis.symbols.iter().map(|s| s.name.as_str());
    let functions = analysis.functions.iter().map(|f| f.name.as_str());
    let classes = analysis.classes.iter().flat_map(|c| {
        std::iter::once(c.name.as_str()).chain(c.methods.iter().map(|m| m.name.as_str()))
    });
    let specifiers = analysis
        .imports
        .iter()
        .flat_map(|i| i.specifiers.iter().map(String::as_str));
    symbols.chain(functions).chain(classes).chain(specifiers)
}

fn structure_of(analysis: &FileAnalysis) -> Vec<StructuralEntry> {
    let mut entries = Vec::new();

    for function in &analysis.functions {
        entries.push(StructuralEntry {
            kind: ResultKind::Function,
            name: function.name.clone(),
            line: function.line,
            detail: format!("{}({})", function.name, function.params.join(", ")),
        });
    }

    for class in &analysis.classes {
        entries.push(StructuralEntry {
            kind: ResultKind::Class,
            name: class.name.clone(),
            line: class.line,
            detail: format!("class {}", class.name),
        });
        for method in &class.methods {
            entries.push(StructuralEntry {
                kind: ResultKind::Function,
                name: method.name.clone(),
                line: method.line,
                detail: format!("{}.{}({})", class.name, method.name, method.params.join(", ")),
            });
        }
    }

    // Functions and classes are covered above with richer detail.
    for symbol in &analysis.symbols {
        let label = match symbol.kind {
            SymbolKind::Function | SymbolKind::Class => continue,
            SymbolKind::Interface => "interface",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
        };
        entries.push(StructuralEntry {
            kind: ResultKind::Symbol,
            name: symbol.name.clone(),
            line: symbol.line,
            detail: format!("{label} {}", symbol.name),
        });
    }

    for import in &analysis.imports {
        let detail = if import.specifiers.is_empty() {
            import.module.clone()
        } else {
            format!("{} ({})", import.module, import.specifiers.join(", "))
        };
        entries.push(StructuralEntry {
            kind: ResultKind::Import,
            name: import.module.clone(),
            line: import.line,
            detail,
        });
    }

    for export in &analysis.exports {
        let detail = match (&export.source, export.is_default) {
            (Some(source), _) => format!("export {} from {source}", export.name),
            (None, true) => format!("export default {}", export.name),
            (None, false) => format!("export {}", export.name),
        };
        entries.push(StructuralEntry {
            kind: ResultKind::Export,
            name: export.name.clone(),
            line: export.line,
            detail,
        });
    }

    entries
}

/// First non-blank lines of content, bounded in bytes.
pub fn preview_of(content: &str) -> String {
    let lines: Vec<&str> = content
        .lines()
        .skip_while(|l| l.trim().is_empty())
        .take(PREVIEW_LINES)
        .collect();
    truncate_at_boundary(&lines.join("\n"), PREVIEW_LEN).to_string()
}

/// Longest prefix of `s` no longer than `max` bytes that ends on a char boundary.
pub fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FileAnalyzer;

    #[test]
    fn test_build_without_analysis() {
        let doc = IndexedDocument::build(
            Path::new("/repo/a.ts"),
            "\n\nconst totalCount = 1;\nconst totalCount2 = totalCount;\n",
            None,
            blake3::hash(b"x"),
        );
        assert_eq!(doc.terms.get("totalcount"), Some(&2));
        assert_eq!(doc.terms.get("total"), Some(&2));
        assert_eq!(doc.metadata.language, Language::TypeScript);
        assert_eq!(doc.metadata.lines, 2);
        assert!(doc.preview.starts_with("const totalCount"));
        assert!(doc.structure.is_empty());
        assert!(doc.analysis.is_none());
    }

    #[test]
    fn test_build_with_analysis() {
        let content = "import { readFile } from 'fs';\nexport class Store {\n  load(key) {}\n}\n";
        let path = Path::new("/repo/store.ts");
        let analysis = FileAnalyzer::new().analyze_file(path, content.as_bytes());
        let doc = IndexedDocument::build(path, content, Some(&analysis), blake3::hash(b"x"));

        let kinds: Vec<_> = doc.structure.iter().map(|e| (e.kind, e.name.as_str())).collect();
        assert!(kinds.contains(&(ResultKind::Class, "Store")));
        assert!(kinds.contains(&(ResultKind::Function, "load")));
        assert!(kinds.contains(&(ResultKind::Import, "fs")));
        assert!(kinds.contains(&(ResultKind::Export, "Store")));
        assert!(doc.terms.contains_key("readfile"));
    }

    #[test]
    fn test_fingerprint_tracks_structure() {
        let path = Path::new("/repo/a.ts");
        let analyzer = FileAnalyzer::new();
        let at = crate::clock::now();
        let first = analyzer.analyze_file_at(path, b"function oldOne() {}\n", at);
        let same = analyzer.analyze_file_at(path, b"function oldOne() {}\n", at);
        let renamed = analyzer.analyze_file_at(path, b"function newOne() {}\n", at);

        assert_eq!(analysis_fingerprint(&first), analysis_fingerprint(&same));
        assert_ne!(analysis_fingerprint(&first), analysis_fingerprint(&renamed));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_at_boundary("héllo", 2), "h");
        assert_eq!(truncate_at_boundary("abc", 10), "abc");
    }
}
