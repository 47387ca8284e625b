//! Declaration and module-reference extraction.
//!
//! Each language family has its own scanner. All of them work on
//! comment-stripped [`CodeLine`]s and bound declaration bodies either by
//! brace depth or by indentation.

mod braced;
mod go;
mod python;
mod ruby;
mod rust;
mod script;

use super::complexity::complexity_of;
use super::language::{Family, Language};
use super::lines::CodeLine;
use super::models::{
    ClassInfo, ExportEntry, FunctionInfo, ImportEntry, ImportKind, Symbol, SymbolKind, Visibility,
};

/// Maximum number of lines scanned to find a declaration's opening brace or closing paren.
const LOOKAHEAD_LINES: usize = 4;

/// Everything extracted from one file.
#[derive(Debug, Default, Clone)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    /// Modules referenced outside import statements (re-exports).
    pub extra_dependencies: Vec<(usize, String)>,
}

impl Extraction {
    fn symbol(&mut self, name: &str, kind: SymbolKind, line: usize, visibility: Visibility) {
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            line,
            visibility,
        });
    }

    fn import(&mut self, module: &str, specifiers: Vec<String>, kind: ImportKind, line: usize) {
        let module = module.trim();
        if module.is_empty() {
            return;
        }
        self.imports.push(ImportEntry {
            module: module.to_string(),
            specifiers,
            kind,
            line,
        });
    }

    fn export(&mut self, name: &str, line: usize, is_default: bool, source: Option<&str>) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.exports.push(ExportEntry {
            name: name.to_string(),
            line,
            is_default,
            source: source.map(str::to_string),
        });
        if let Some(source) = source {
            self.extra_dependencies.push((line, source.to_string()));
        }
    }

    /// Get or create the class entry with the given name.
    fn class_mut(&mut self, name: &str, line: usize, visibility: Visibility) -> &mut ClassInfo {
        let pos = match self.classes.iter().position(|c| c.name == name) {
            Some(pos) => pos,
            None => {
                self.classes.push(ClassInfo {
                    name: name.to_string(),
                    line,
                    methods: Vec::new(),
                    properties: Vec::new(),
                    visibility,
                });
                self.classes.len() - 1
            }
        };
        &mut self.classes[pos]
    }

    /// Dependency identifiers in source order, first occurrence kept.
    #[must_use]
    pub fn dependencies(&self) -> Vec<String> {
        let mut refs: Vec<(usize, &str)> = self
            .imports
            .iter()
            .map(|i| (i.line, i.module.as_str()))
            .chain(
                self.extra_dependencies
                    .iter()
                    .map(|(line, m)| (*line, m.as_str())),
            )
            .collect();
        refs.sort_by_key(|(line, _)| *line);

        let mut seen = std::collections::HashSet::new();
        refs.into_iter()
            .filter(|(_, m)| seen.insert(*m))
            .map(|(_, m)| m.to_string())
            .collect()
    }
}

/// Extract declarations and references for a language.
#[must_use]
pub fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    match language.family() {
        Family::Script => script::extract(lines, language),
        Family::Python => python::extract(lines, language),
        Family::Rust => rust::extract(lines, language),
        Family::Go => go::extract(lines, language),
        Family::Braced => braced::extract(lines, language),
        Family::Ruby => ruby::extract(lines, language),
        Family::Other => Extraction::default(),
    }
}

/// Net brace depth change of a line.
fn brace_delta(bare: &str) -> i32 {
    bare.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Index of the line closing the brace block opened at or after `start`.
///
/// Declarations without a body (ending in `;` before any brace, or with no
/// brace within the lookahead window) end on the line they start.
fn block_end_braced(lines: &[CodeLine], start: usize) -> usize {
    let mut depth = 0i32;
    let mut opened = false;

    for (offset, line) in lines[start..].iter().enumerate() {
        for c in line.bare.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return start + offset;
        }
        if !opened {
            if line.bare.trim_end().ends_with(';') {
                return start + offset;
            }
            if offset >= LOOKAHEAD_LINES {
                return start;
            }
        }
    }

    lines.len().saturating_sub(1).max(start)
}

/// Index of the last line indented deeper than the line at `start`.
fn block_end_indented(lines: &[CodeLine], start: usize) -> usize {
    let base = lines[start].indent;
    let mut end = start;
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if line.indent <= base {
            break;
        }
        end = start + 1 + offset;
    }
    end
}

/// Text between the parentheses that follow byte offset `from` on line `start`.
///
/// Generic parameter lists (`<...>`) directly after the name are skipped and
/// parameters may continue over following lines.
fn params_after(lines: &[CodeLine], start: usize, from: usize) -> String {
    let mut out = String::new();
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut started = false;

    for line in lines.iter().skip(start).take(LOOKAHEAD_LINES * 2) {
        let text = if line.number == lines[start].number {
            line.code.get(from..).unwrap_or("")
        } else {
            line.code.as_str()
        };
        for c in text.chars() {
            if !started {
                match c {
                    '<' => angle += 1,
                    '>' => angle -= 1,
                    '(' if angle <= 0 => {
                        started = true;
                        depth = 1;
                    }
                    _ => {}
                }
                continue;
            }
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return out;
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        if !started {
            return out;
        }
        out.push(' ');
    }
    out
}

/// Split on `sep` outside of any bracket nesting.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut last = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            c if c == sep && depth <= 0 => {
                parts.push(&s[last..i]);
                last = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[last..]);
    parts
}

/// How a parameter's name is positioned within its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamStyle {
    /// `name: Type`, `Type name`, `name = default` (name is the last word before `:` or `=`).
    LastWord,
    /// `name Type` (Go).
    FirstWord,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Parse parameter names from the text between parentheses.
fn parse_params(raw: &str, style: ParamStyle) -> Vec<String> {
    split_top_level(raw, ',')
        .into_iter()
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let head = match style {
                ParamStyle::LastWord => {
                    let cut = part.find([':', '=']).unwrap_or(part.len());
                    &part[..cut]
                }
                ParamStyle::FirstWord => part,
            };
            let words: Vec<&str> = head
                .split(|c: char| !is_ident_char(c))
                .filter(|w| !w.is_empty())
                .collect();
            let word = match style {
                ParamStyle::LastWord => words.last(),
                ParamStyle::FirstWord => words.first(),
            }?;
            let name = word.trim_start_matches('$');
            if name.is_empty() || matches!(name, "self" | "this" | "cls") {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

/// Parse a comma separated name list, keeping the name before `as`.
fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let part = part.trim().trim_start_matches("type ").trim();
            let name = part.split_whitespace().next()?;
            let name = name.trim_matches(|c: char| !is_ident_char(c) && c != '*');
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Build a [`FunctionInfo`] whose body spans `lines[start..=end]`.
#[allow(clippy::too_many_arguments)]
fn function_at(
    lines: &[CodeLine],
    start: usize,
    end: usize,
    name: &str,
    params: Vec<String>,
    visibility: Visibility,
    is_async: bool,
    language: Language,
) -> FunctionInfo {
    let end = end.max(start).min(lines.len().saturating_sub(1));
    FunctionInfo {
        name: name.to_string(),
        line: lines[start].number,
        params,
        complexity: complexity_of(&lines[start..=end], language),
        visibility,
        is_async,
    }
}

/// Words that look like declarations to the method patterns but are control flow.
const CONTROL_WORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "switch", "case", "catch", "return", "new", "throw",
    "await", "yield", "delete", "typeof", "function", "do", "try", "sizeof", "goto", "using",
    "lock", "match", "when", "super", "in", "of", "with", "elif",
];

fn is_control_word(word: &str) -> bool {
    CONTROL_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lines::code_lines;

    #[test]
    fn test_block_end_braced() {
        let lines = code_lines(
            "function a() {\n  if (x) {\n    y();\n  }\n}\nfunction b() {}\n",
            Language::JavaScript,
        );
        assert_eq!(block_end_braced(&lines, 0), 4);
        assert_eq!(block_end_braced(&lines, 5), 5);
    }

    #[test]
    fn test_block_end_braced_without_body() {
        let lines = code_lines("abstract run(): void;\nother();\n", Language::TypeScript);
        assert_eq!(block_end_braced(&lines, 0), 0);
    }

    #[test]
    fn test_block_end_indented() {
        let lines = code_lines(
            "def f():\n    a = 1\n    if a:\n        pass\nx = 2\n",
            Language::Python,
        );
        assert_eq!(block_end_indented(&lines, 0), 3);
        assert_eq!(block_end_indented(&lines, 4), 4);
    }

    #[test]
    fn test_parse_params_styles() {
        assert_eq!(
            parse_params("a: number, b?: string = 'x', ...rest: any[]", ParamStyle::LastWord),
            vec!["a", "b", "rest"]
        );
        assert_eq!(
            parse_params("final int count, Map<String, Integer> map", ParamStyle::LastWord),
            vec!["count", "map"]
        );
        assert_eq!(
            parse_params("&self, mut value: Vec<u8>", ParamStyle::LastWord),
            vec!["value"]
        );
        assert_eq!(
            parse_params("a, b int, opts ...Option", ParamStyle::FirstWord),
            vec!["a", "b", "opts"]
        );
        assert!(parse_params("", ParamStyle::LastWord).is_empty());
    }

    #[test]
    fn test_params_after_multiline_and_generics() {
        let lines = code_lines(
            "function f<T extends Map<string, number>>(\n  a: T,\n  b: number\n) {\n}\n",
            Language::TypeScript,
        );
        let raw = params_after(&lines, 0, "function f".len());
        assert_eq!(parse_params(&raw, ParamStyle::LastWord), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_name_list() {
        assert_eq!(
            parse_name_list(" a, b as c , type D "),
            vec!["a", "b", "D"]
        );
    }
}
