//! Comment-aware line scanning.

use super::language::{CommentSyntax, Language};

/// A source line that carries code after comments are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    /// 1-based line number in the original content.
    pub number: usize,
    /// Line text with comments removed.
    pub code: String,
    /// Same as `code` but with string literal contents blanked out.
    pub bare: String,
    /// Leading whitespace width of the original line.
    pub indent: usize,
}

/// Characters that open a string literal in a language.
fn string_quotes(language: Language) -> &'static [char] {
    match language {
        // Single quotes are lifetimes and chars in Rust.
        Language::Rust => &['"'],
        Language::TypeScript | Language::JavaScript => &['"', '\'', '`'],
        Language::Markdown | Language::Html | Language::Xml | Language::Unknown => &[],
        _ => &['"', '\''],
    }
}

/// Split content into code-bearing lines.
///
/// Blank lines and lines that hold only comments are dropped. Block comments
/// may span lines; string literals never do.
#[must_use]
pub fn code_lines(content: &str, language: Language) -> Vec<CodeLine> {
    let syntax = language.comment_syntax();
    let quotes = string_quotes(language);
    let mut in_block = false;
    let mut out = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let (code, bare) = scan_line(raw, syntax, quotes, &mut in_block);
        if code.trim().is_empty() {
            continue;
        }
        let indent = raw.len() - raw.trim_start().len();
        out.push(CodeLine {
            number: idx + 1,
            code: code.trim_end().to_string(),
            bare: bare.trim_end().to_string(),
            indent,
        });
    }

    out
}

fn scan_line(
    raw: &str,
    syntax: CommentSyntax,
    quotes: &[char],
    in_block: &mut bool,
) -> (String, String) {
    let mut code = String::with_capacity(raw.len());
    let mut bare = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < raw.len() {
        let rest = &raw[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if *in_block {
            if let Some((_, end)) = syntax.block {
                if rest.starts_with(end) {
                    *in_block = false;
                    i += end.len();
                    code.push(' ');
                    bare.push(' ');
                    continue;
                }
            }
            i += c.len_utf8();
            continue;
        }

        if let Some(q) = quote {
            code.push(c);
            i += c.len_utf8();
            if c == '\\' {
                if let Some(next) = raw[i..].chars().next() {
                    code.push(next);
                    bare.push_str("  ");
                    i += next.len_utf8();
                    continue;
                }
            }
            if c == q {
                quote = None;
                bare.push(c);
            } else {
                bare.push(' ');
            }
            continue;
        }

        if let Some((start, _)) = syntax.block {
            if rest.starts_with(start) {
                *in_block = true;
                i += start.len();
                continue;
            }
        }

        if syntax.line.iter().any(|m| rest.starts_with(m)) {
            break;
        }

        if quotes.contains(&c) {
            quote = Some(c);
        }
        code.push(c);
        bare.push(c);
        i += c.len_utf8();
    }

    (code, bare)
}

/// Count lines that are neither blank nor comment-only.
#[must_use]
pub fn count_code_lines(content: &str, language: Language) -> usize {
    code_lines(content, language).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_and_line_comments() {
        let src = "// header\n\nlet a = 1;\n   // indented comment\nlet b = 2; // trailing\n";
        let lines = code_lines(src, Language::TypeScript);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].code, "let b = 2;");
    }

    #[test]
    fn test_block_comments_span_lines() {
        let src = "/*\n * doc\n */\nfn main() {}\nlet x = /* inline */ 3;";
        let lines = code_lines(src, Language::Rust);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].code, "fn main() {}");
        assert!(lines[1].code.starts_with("let x ="));
        assert!(!lines[1].code.contains("inline"));
    }

    #[test]
    fn test_comment_markers_inside_strings_are_code() {
        let src = "const url = \"http://example.com\";";
        let lines = code_lines(src, Language::JavaScript);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].code.contains("http://example.com"));
        assert!(!lines[0].bare.contains("example"));
    }

    #[test]
    fn test_python_hash_and_docstring() {
        let src = "\"\"\"Module doc.\n\nMore.\n\"\"\"\n# comment\ndef f():\n    return 1\n";
        assert_eq!(count_code_lines(src, Language::Python), 2);
    }

    #[test]
    fn test_indent_recorded() {
        let lines = code_lines("def f():\n    pass\n", Language::Python);
        assert_eq!(lines[0].indent, 0);
        assert_eq!(lines[1].indent, 4);
    }
}
