//! Heuristic structural analysis of source files.
//!
//! This module provides:
//! - Language detection by extension
//! - Comment-aware line counting
//! - Keyword based complexity scoring
//! - Per-language declaration, import and export extraction
//!
//! The analyzer holds no state. Every call produces a fresh [`FileAnalysis`].

mod complexity;
mod extract;
mod language;
mod lines;
mod models;

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chrono::{DateTime, Utc};

pub use complexity::{complexity_of, line_branches};
pub use extract::Extraction;
pub use language::{is_binary_extension, source_extensions, Family, Language};
pub use lines::{code_lines, count_code_lines, CodeLine};
pub use models::{
    ClassInfo, ExportEntry, FileAnalysis, FunctionInfo, ImportEntry, ImportKind, Symbol,
    SymbolKind, Visibility,
};

/// Bytes inspected for a NUL byte when sniffing binary content.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Encoding tags.
pub const ENCODING_UTF8: &str = "utf-8";
pub const ENCODING_LOSSY: &str = "utf-8-lossy";
pub const ENCODING_BINARY: &str = "binary";

/// Stateless file analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAnalyzer;

impl FileAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Detect the language of a path from its extension.
    #[must_use]
    pub fn detect_language(&self, path: &Path) -> Language {
        Language::from_path(path)
    }

    /// Check whether a path has a known binary extension.
    #[must_use]
    pub fn is_binary_file(&self, path: &Path) -> bool {
        is_binary_extension(path)
    }

    /// Analyze content, stamping the analysis with the current time.
    #[must_use]
    pub fn analyze_file(&self, path: &Path, content: &[u8]) -> FileAnalysis {
        self.analyze_file_at(path, content, crate::clock::now())
    }

    /// Analyze content with an explicit last-modified time.
    ///
    /// Never panics. Invalid UTF-8 is decoded lossily and a failure inside
    /// declaration extraction degrades to an analysis with line count and
    /// complexity only.
    #[must_use]
    pub fn analyze_file_at(
        &self,
        path: &Path,
        content: &[u8],
        last_modified: DateTime<Utc>,
    ) -> FileAnalysis {
        let language = self.detect_language(path);
        let size = content.len() as u64;

        if self.is_binary_file(path) || has_nul_byte(content) {
            tracing::trace!(path = %path.display(), "Binary content, skipping extraction");
            return FileAnalysis {
                path: path.to_path_buf(),
                language,
                size,
                lines: 0,
                complexity: 1,
                symbols: Vec::new(),
                dependencies: Vec::new(),
                imports: Vec::new(),
                exports: Vec::new(),
                functions: Vec::new(),
                classes: Vec::new(),
                last_modified,
                encoding: ENCODING_BINARY.to_string(),
                is_binary: true,
            };
        }

        let (text, encoding) = match String::from_utf8_lossy(content) {
            Cow::Borrowed(text) => (Cow::Borrowed(text), ENCODING_UTF8),
            Cow::Owned(text) => (Cow::Owned(text), ENCODING_LOSSY),
        };

        let lines = code_lines(&text, language);
        let complexity = complexity_of(&lines, language);
        let extraction =
            panic::catch_unwind(AssertUnwindSafe(|| extract::extract(&lines, language)))
                .unwrap_or_else(|_| {
                    tracing::warn!(
                        path = %path.display(),
                        language = %language,
                        "Declaration extraction failed, returning partial analysis"
                    );
                    Extraction::default()
                });
        let dependencies = extraction.dependencies();

        tracing::trace!(
            path = %path.display(),
            language = %language,
            lines = lines.len(),
            complexity,
            symbols = extraction.symbols.len(),
            "Analyzed file"
        );

        FileAnalysis {
            path: path.to_path_buf(),
            language,
            size,
            lines: lines.len(),
            complexity,
            symbols: extraction.symbols,
            dependencies,
            imports: extraction.imports,
            exports: extraction.exports,
            functions: extraction.functions,
            classes: extraction.classes,
            last_modified,
            encoding: encoding.to_string(),
            is_binary: false,
        }
    }
}

fn has_nul_byte(content: &[u8]) -> bool {
    content[..content.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(path: &str, content: &str) -> FileAnalysis {
        FileAnalyzer::new().analyze_file(Path::new(path), content.as_bytes())
    }

    #[test]
    fn test_branch_counting() {
        let analysis = analyze(
            "src/check.ts",
            "function check(a: number, b: number) {\n  if (a > 0 && b > 0) {\n    return 1;\n  }\n  for (const x of [a, b]) {\n    if (x) { return x; }\n  }\n  return 0;\n}\n",
        );
        assert!(analysis.complexity >= 5);
        assert_eq!(analysis.complexity, 5);
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].complexity, 5);
    }

    #[test]
    fn test_line_count_excludes_comments() {
        let analysis = analyze(
            "lib.py",
            "# header\n\n\"\"\"\nDocstring.\n\"\"\"\nimport os\n\ndef main():\n    pass  # trailing\n",
        );
        assert_eq!(analysis.lines, 3);
        assert_eq!(analysis.language, Language::Python);
        assert_eq!(analysis.encoding, ENCODING_UTF8);
        assert_eq!(analysis.dependencies, vec!["os"]);
    }

    #[test]
    fn test_binary_extension_short_circuits() {
        let analysis = FileAnalyzer::new().analyze_file(Path::new("logo.png"), b"function x() {}");
        assert!(analysis.is_binary);
        assert_eq!(analysis.lines, 0);
        assert_eq!(analysis.encoding, ENCODING_BINARY);
        assert!(analysis.symbols.is_empty());
        assert!(analysis.dependencies.is_empty());
    }

    #[test]
    fn test_nul_byte_is_binary() {
        let analysis =
            FileAnalyzer::new().analyze_file(Path::new("data.ts"), b"import x from 'y';\0\0");
        assert!(analysis.is_binary);
        assert!(analysis.dependencies.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut content = b"export const a = 1;\n".to_vec();
        content.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let analysis = FileAnalyzer::new().analyze_file(Path::new("a.js"), &content);
        assert!(!analysis.is_binary);
        assert_eq!(analysis.encoding, ENCODING_LOSSY);
        assert_eq!(analysis.exports.len(), 1);
    }

    #[test]
    fn test_unknown_language_counts_lines_only() {
        let analysis = analyze("notes.txt", "one\n\ntwo\nif this then that\n");
        assert_eq!(analysis.language, Language::Unknown);
        assert_eq!(analysis.lines, 3);
        assert!(analysis.symbols.is_empty());
        assert!(analysis.complexity >= 1);
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        let inputs = [
            "function (",
            "class {{{{",
            "import { from",
            "}}}}}}",
            "def (:\n  \n    ",
            "\"unterminated",
            "/* never closed",
        ];
        for input in inputs {
            for path in ["a.ts", "a.py", "a.rs", "a.go", "A.java", "a.rb", "a.php", "a.cpp"] {
                let analysis = analyze(path, input);
                assert!(analysis.complexity >= 1);
            }
        }
    }

    #[test]
    fn test_dependencies_in_source_order() {
        let analysis = analyze(
            "src/app.ts",
            "import b from './b';\nimport { a } from './a';\nconst c = require('./c');\nimport again from './b';\nexport * from './d';\n",
        );
        assert_eq!(analysis.dependencies, vec!["./b", "./a", "./c", "./d"]);
    }
}
