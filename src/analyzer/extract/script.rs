//! JavaScript and TypeScript declarations.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    block_end_braced, brace_delta, function_at, is_control_word, params_after, parse_name_list,
    parse_params, Extraction, ParamStyle,
};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{FunctionInfo, ImportKind, SymbolKind, Visibility};

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(export\s+)?(default\s+)?(declare\s+)?(async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
    )
    .expect("valid regex")
});

static ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]*)?=\s*(async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]*)?=>(.*)$",
    )
    .expect("valid regex")
});

static FUNCTION_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]*)?=\s*(async\s+)?function\b",
    )
    .expect("valid regex")
});

static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(export\s+)?(default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(export\s+)?(?:declare\s+)?interface\s+([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static ENUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)").expect("valid regex")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:(?:public|private|protected|static|readonly|abstract|override|async|get|set)\s+)*)\*?(#?[A-Za-z_$][\w$]*)\s*(?:<.*?>)?\s*\(",
    )
    .expect("valid regex")
});

static PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:(?:public|private|protected|static|readonly|declare|override)\s+)*)(#?[A-Za-z_$][\w$]*)\s*[?!]?\s*(?::|=|;|$)",
    )
    .expect("valid regex")
});

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*import\s+(?:type\s+)?(.+?)\s+from\s+['"]([^'"]+)['"]"#).expect("valid regex")
});

static IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).expect("valid regex"));

static DYNAMIC_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));

static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));

static REQUIRE_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:const|let|var)\s+(\{[^}]*\}|[A-Za-z_$][\w$]*)\s*=\s*require\(")
        .expect("valid regex")
});

static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*export\s+(default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|enum|type|namespace)\s+([A-Za-z_$][\w$]*)",
    )
    .expect("valid regex")
});

static EXPORT_DEFAULT_IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$").expect("valid regex")
});

static EXPORT_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*export\s+(?:type\s+)?\{([^}]*)\}\s*(?:from\s+['"]([^'"]+)['"])?"#)
        .expect("valid regex")
});

static EXPORT_STAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*export\s+\*\s*(?:as\s+([A-Za-z_$][\w$]*)\s+)?from\s+['"]([^'"]+)['"]"#)
        .expect("valid regex")
});

static COMMONJS_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:module\.)?exports(?:\.([A-Za-z_$][\w$]*))?\s*=").expect("valid regex")
});

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();
    extract_modules(lines, &mut out);

    let mut depth = 0i32;
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let code = line.code.as_str();

        if let Some(caps) = CLASS.captures(code) {
            let name = &caps[3];
            let visibility = exported(caps.get(1).is_some());
            let end = block_end_braced(lines, i);
            out.symbol(name, SymbolKind::Class, line.number, visibility);
            let class = out.class_mut(name, line.number, visibility);
            let (methods, properties) = class_members(lines, i, end, language);
            class.methods = methods;
            class.properties = properties;
            i = end + 1;
            continue;
        }

        if let Some(caps) = INTERFACE.captures(code) {
            out.symbol(
                &caps[2],
                SymbolKind::Interface,
                line.number,
                exported(caps.get(1).is_some()),
            );
            i = block_end_braced(lines, i) + 1;
            continue;
        }

        if let Some(caps) = ENUM.captures(code) {
            out.symbol(
                &caps[2],
                SymbolKind::Enum,
                line.number,
                exported(caps.get(1).is_some()),
            );
            i = block_end_braced(lines, i) + 1;
            continue;
        }

        if let Some(caps) = FUNCTION.captures(code) {
            let Some(name) = caps.get(5) else {
                i += 1;
                continue;
            };
            let end = block_end_braced(lines, i);
            let params = parse_params(&params_after(lines, i, name.end()), ParamStyle::LastWord);
            out.symbol(
                name.as_str(),
                SymbolKind::Function,
                line.number,
                exported(caps.get(1).is_some()),
            );
            out.functions.push(function_at(
                lines,
                i,
                end,
                name.as_str(),
                params,
                exported(caps.get(1).is_some()),
                caps.get(4).is_some(),
                language,
            ));
            i = end + 1;
            continue;
        }

        if let Some(caps) = ARROW.captures(code) {
            let name = caps.get(2).map_or("", |m| m.as_str());
            let body = caps.get(4).map_or("", |m| m.as_str()).trim();
            let end = if body.is_empty() || body.starts_with('{') {
                block_end_braced(lines, i)
            } else {
                i
            };
            let visibility = exported(caps.get(1).is_some());
            let params = caps
                .get(2)
                .map(|m| parse_params(&params_after(lines, i, m.end()), ParamStyle::LastWord))
                .unwrap_or_default();
            out.symbol(name, SymbolKind::Function, line.number, visibility);
            out.functions.push(function_at(
                lines,
                i,
                end,
                name,
                params,
                visibility,
                caps.get(3).is_some(),
                language,
            ));
            i = end + 1;
            continue;
        }

        if let Some(caps) = FUNCTION_EXPR.captures(code) {
            let name = &caps[2];
            let visibility = exported(caps.get(1).is_some());
            let end = block_end_braced(lines, i);
            let name_end = caps.get(0).map_or(0, |m| m.end());
            let params = parse_params(&params_after(lines, i, name_end), ParamStyle::LastWord);
            out.symbol(name, SymbolKind::Function, line.number, visibility);
            out.functions.push(function_at(
                lines,
                i,
                end,
                name,
                params,
                visibility,
                caps.get(3).is_some(),
                language,
            ));
            i = end + 1;
            continue;
        }

        if depth == 0 && !code.contains("require(") {
            if let Some(caps) = VARIABLE.captures(code) {
                out.symbol(
                    &caps[2],
                    SymbolKind::Variable,
                    line.number,
                    exported(caps.get(1).is_some()),
                );
            }
        }

        depth += brace_delta(&line.bare);
        i += 1;
    }

    out
}

const fn exported(is_exported: bool) -> Visibility {
    if is_exported {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

/// Methods and properties declared directly in a class body.
fn class_members(
    lines: &[CodeLine],
    start: usize,
    end: usize,
    language: Language,
) -> (Vec<FunctionInfo>, Vec<String>) {
    let mut methods = Vec::new();
    let mut properties: Vec<String> = Vec::new();
    let mut depth = brace_delta(&lines[start].bare);
    let mut j = start + 1;

    while j < end {
        let line = &lines[j];
        if depth == 1 {
            if let Some(caps) = METHOD.captures(&line.code) {
                let name_match = caps.get(2);
                let name = name_match.map_or("", |m| m.as_str());
                if !is_control_word(name) {
                    let modifiers = caps.get(1).map_or("", |m| m.as_str());
                    let visibility = member_visibility(modifiers, name);
                    let is_async = modifiers.split_whitespace().any(|w| w == "async");
                    let from = name_match.map_or(0, |m| m.end());
                    let params = parse_params(&params_after(lines, j, from), ParamStyle::LastWord);
                    let mend = block_end_braced(lines, j).min(end);
                    methods.push(function_at(
                        lines, j, mend, name, params, visibility, is_async, language,
                    ));
                    if mend == end {
                        break;
                    }
                    j = mend + 1;
                    continue;
                }
            } else if let Some(caps) = PROPERTY.captures(&line.code) {
                let name = caps[2].trim_start_matches('#').to_string();
                if !is_control_word(&name) && !properties.contains(&name) {
                    properties.push(name);
                }
            }
        }
        depth += brace_delta(&line.bare);
        j += 1;
    }

    (methods, properties)
}

fn member_visibility(modifiers: &str, name: &str) -> Visibility {
    let private = modifiers
        .split_whitespace()
        .any(|w| w == "private" || w == "protected");
    if private || name.starts_with('#') || name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

/// Join multi-line `import { ... } from` / `export { ... }` statements.
fn statements(lines: &[CodeLine]) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let code = lines[i].code.trim();
        let opens_list = (code.starts_with("import") || code.starts_with("export"))
            && code.contains('{')
            && !code.contains('}');
        if opens_list {
            let mut joined = code.to_string();
            let mut j = i + 1;
            while j < lines.len() && j < i + 64 {
                joined.push(' ');
                joined.push_str(lines[j].code.trim());
                if lines[j].code.contains('}') {
                    break;
                }
                j += 1;
            }
            out.push((lines[i].number, joined));
            i = j + 1;
        } else {
            out.push((lines[i].number, code.to_string()));
            i += 1;
        }
    }
    out
}

fn extract_modules(lines: &[CodeLine], out: &mut Extraction) {
    for (line, code) in statements(lines) {
        if let Some(caps) = IMPORT_FROM.captures(&code) {
            out.import(
                &caps[2],
                import_specifiers(&caps[1]),
                ImportKind::Import,
                line,
            );
        } else if let Some(caps) = IMPORT_BARE.captures(&code) {
            out.import(&caps[1], Vec::new(), ImportKind::Import, line);
        }

        for caps in DYNAMIC_IMPORT.captures_iter(&code) {
            out.import(&caps[1], Vec::new(), ImportKind::DynamicImport, line);
        }

        for caps in REQUIRE.captures_iter(&code) {
            let specifiers = REQUIRE_BINDING
                .captures(&code)
                .map(|b| import_specifiers(&b[1]))
                .unwrap_or_default();
            out.import(&caps[1], specifiers, ImportKind::Require, line);
        }

        if let Some(caps) = EXPORT_STAR.captures(&code) {
            let name = caps.get(1).map_or("*", |m| m.as_str());
            out.export(name, line, false, Some(&caps[2]));
        } else if let Some(caps) = EXPORT_LIST.captures(&code) {
            let source = caps.get(2).map(|m| m.as_str());
            for name in export_names(&caps[1]) {
                let is_default = name == "default";
                out.export(&name, line, is_default, source);
            }
        } else if let Some(caps) = EXPORT_DECL.captures(&code) {
            out.export(&caps[2], line, caps.get(1).is_some(), None);
        } else if let Some(caps) = EXPORT_DEFAULT_IDENT.captures(&code) {
            out.export(&caps[1], line, true, None);
        } else if let Some(caps) = COMMONJS_EXPORT.captures(&code) {
            match caps.get(1) {
                Some(name) => out.export(name.as_str(), line, false, None),
                None => out.export("default", line, true, None),
            }
        }
    }
}

/// Names bound by an import clause: `Default, { a, b as c }`, `* as ns`.
fn import_specifiers(clause: &str) -> Vec<String> {
    let clause = clause.trim();
    let mut names = Vec::new();
    let (outside, inside) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (
            format!("{}{}", &clause[..open], &clause[close + 1..]),
            Some(&clause[open + 1..close]),
        ),
        _ => (clause.to_string(), None),
    };

    for part in outside.split(',') {
        let part = part.trim();
        if let Some(ns) = part.strip_prefix("* as ") {
            names.push(ns.trim().to_string());
        } else if !part.is_empty() {
            names.extend(parse_name_list(part));
        }
    }
    if let Some(inside) = inside {
        names.extend(parse_name_list(inside));
    }
    names
}

/// Exported names of an `export { a, b as c }` list (the `as` alias wins).
fn export_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|part| {
            let part = part.trim();
            let name = part.rsplit(" as ").next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lines::code_lines;

    fn run(src: &str) -> Extraction {
        extract(&code_lines(src, Language::TypeScript), Language::TypeScript)
    }

    #[test]
    fn test_functions_and_visibility() {
        let ex = run(
            "export async function load(url: string, retries = 3) {\n  if (x) { return 1; }\n}\nfunction helper() {}\nexport const add = (a: number, b: number) => a + b;\n",
        );
        let names: Vec<_> = ex.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["load", "helper", "add"]);
        assert!(ex.functions[0].is_async);
        assert_eq!(ex.functions[0].params, vec!["url", "retries"]);
        assert_eq!(ex.functions[0].complexity, 2);
        assert_eq!(ex.functions[0].visibility, Visibility::Public);
        assert_eq!(ex.functions[1].visibility, Visibility::Private);
        assert_eq!(ex.functions[2].params, vec!["a", "b"]);
    }

    #[test]
    fn test_class_members() {
        let ex = run(
            "export class Store {\n  private items: string[] = [];\n  count = 0;\n  constructor(private readonly name: string) {}\n  static getInstance(): Store {\n    return new Store('x');\n  }\n  async save(item: string): Promise<void> {\n    if (item) {\n      this.items.push(item);\n    }\n  }\n}\n",
        );
        assert_eq!(ex.classes.len(), 1);
        let class = &ex.classes[0];
        assert_eq!(class.name, "Store");
        assert_eq!(class.visibility, Visibility::Public);
        let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["constructor", "getInstance", "save"]);
        assert!(class.methods[2].is_async);
        assert_eq!(class.methods[2].complexity, 2);
        assert_eq!(class.properties, vec!["items", "count"]);
    }

    #[test]
    fn test_symbol_kinds() {
        let ex = run(
            "export interface Props { a: string }\nenum Color { Red }\nexport const LIMIT = 10;\nclass A {}\n",
        );
        let kinds: Vec<_> = ex.symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Props", SymbolKind::Interface),
                ("Color", SymbolKind::Enum),
                ("LIMIT", SymbolKind::Variable),
                ("A", SymbolKind::Class),
            ]
        );
    }

    #[test]
    fn test_imports_in_source_order() {
        let ex = run(
            "import React, { useState as useS } from 'react';\nimport './styles.css';\nimport {\n  a,\n  b,\n} from '../lib/util';\nconst fs = require('fs');\nconst lazy = () => import('./lazy');\n",
        );
        let modules: Vec<_> = ex.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(
            modules,
            vec!["react", "./styles.css", "../lib/util", "fs", "./lazy"]
        );
        assert_eq!(ex.imports[0].specifiers, vec!["React", "useState"]);
        assert_eq!(ex.imports[2].specifiers, vec!["a", "b"]);
        assert_eq!(ex.imports[3].kind, ImportKind::Require);
        assert_eq!(ex.imports[4].kind, ImportKind::DynamicImport);
        assert_eq!(
            ex.dependencies(),
            vec!["react", "./styles.css", "../lib/util", "fs", "./lazy"]
        );
    }

    #[test]
    fn test_exports() {
        let ex = run(
            "export default class App {}\nexport { a, b as c } from './x';\nexport * from './all';\nconst z = 1;\nexport default z;\n",
        );
        let names: Vec<_> = ex.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["App", "a", "c", "*", "z"]);
        assert!(ex.exports[0].is_default);
        assert_eq!(ex.exports[1].source.as_deref(), Some("./x"));
        assert_eq!(ex.dependencies(), vec!["./x", "./all"]);
    }
}
