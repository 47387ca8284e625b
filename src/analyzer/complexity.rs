//! Heuristic cyclomatic-style complexity.
//!
//! Complexity is 1 plus one per branching keyword, ternary, logical
//! short-circuit operator and language-specific branch construct found in
//! code with comments and string contents removed.

use once_cell::sync::Lazy;
use regex::Regex;

use super::language::Language;
use super::lines::CodeLine;

static BRANCH_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|else|switch|case|for|foreach|while|catch)\b").expect("valid regex")
});

static TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\?\s").expect("valid regex"));

static SHORT_CIRCUIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"&&|\|\|").expect("valid regex"));

static PYTHON_EXTRA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:elif|except|and|or)\b").expect("valid regex"));

static RUBY_EXTRA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:elsif|unless|until|rescue|when|and|or)\b").expect("valid regex")
});

static RUST_EXTRA: Lazy<Regex> = Lazy::new(|| Regex::new(r"=>").expect("valid regex"));

static GO_EXTRA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bselect\b").expect("valid regex"));

static KOTLIN_EXTRA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwhen\b").expect("valid regex"));

/// Branch count contributed by a single line (excluding the baseline).
#[must_use]
pub fn line_branches(bare: &str, language: Language) -> u32 {
    let mut count = BRANCH_KEYWORDS.find_iter(bare).count() + SHORT_CIRCUIT.find_iter(bare).count();

    if !matches!(language, Language::Rust | Language::Python) {
        count += TERNARY.find_iter(bare).count();
    }

    count += match language {
        Language::Python => PYTHON_EXTRA.find_iter(bare).count(),
        Language::Ruby => RUBY_EXTRA.find_iter(bare).count(),
        Language::Rust => RUST_EXTRA.find_iter(bare).count(),
        Language::Go => GO_EXTRA.find_iter(bare).count(),
        Language::Kotlin => KOTLIN_EXTRA.find_iter(bare).count(),
        _ => 0,
    };

    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Complexity of a run of lines: baseline 1 plus all branches.
#[must_use]
pub fn complexity_of(lines: &[CodeLine], language: Language) -> u32 {
    lines.iter().fold(1u32, |acc, line| {
        acc.saturating_add(line_branches(&line.bare, language))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lines::code_lines;

    fn complexity(src: &str, language: Language) -> u32 {
        complexity_of(&code_lines(src, language), language)
    }

    #[test]
    fn test_baseline_is_one() {
        assert_eq!(complexity("", Language::TypeScript), 1);
        assert_eq!(complexity("const a = 1;", Language::TypeScript), 1);
    }

    #[test]
    fn test_counts_branches_and_logical_operators() {
        let src = "if (a) {}\nif (b && c) {}\nfor (const x of xs) {}\n";
        assert_eq!(complexity(src, Language::TypeScript), 5);
    }

    #[test]
    fn test_ignores_comments_and_strings() {
        let src = "// if for while\nconst s = \"if (x) && y\";\n";
        assert_eq!(complexity(src, Language::JavaScript), 1);
    }

    #[test]
    fn test_ternary_counted_outside_rust() {
        assert_eq!(complexity("const x = a ? b : c;", Language::TypeScript), 2);
        assert_eq!(complexity("let x = foo()?;", Language::Rust), 1);
    }

    #[test]
    fn test_rust_match_arms() {
        let src = "match v {\n    Some(x) => x,\n    None => 0,\n}\n";
        assert_eq!(complexity(src, Language::Rust), 3);
    }

    #[test]
    fn test_python_keywords() {
        let src = "if a and b:\n    pass\nelif c:\n    pass\n";
        // if + and + elif
        assert_eq!(complexity(src, Language::Python), 4);
    }
}
