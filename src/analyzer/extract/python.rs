//! Python declarations.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    block_end_indented, function_at, params_after, parse_name_list, parse_params, Extraction,
    ParamStyle,
};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{FunctionInfo, ImportKind, SymbolKind, Visibility};

static DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(async\s+)?def\s+([A-Za-z_]\w*)").expect("valid regex")
});

static CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*class\s+([A-Za-z_]\w*)").expect("valid regex"));

static ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*)\s*(?::[^=]+)?=[^=]").expect("valid regex")
});

static SELF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bself\.([A-Za-z_]\w*)\s*(?::[^=]+)?=[^=]").expect("valid regex"));

static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*import\s+(.+)$").expect("valid regex"));

static FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*from\s+(\.*[\w.]*)\s+import\s+(.+)$").expect("valid regex"));

static ALL_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__all__\s*=\s*[\[(](.*)[\])]").expect("valid regex"));

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([A-Za-z_]\w*)['"]"#).expect("valid regex"));

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();
    extract_modules(lines, &mut out);

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let code = line.code.as_str();

        if let Some(caps) = CLASS.captures(code) {
            let name = &caps[1];
            let end = block_end_indented(lines, i);
            let visibility = naming_visibility(name);
            out.symbol(name, SymbolKind::Class, line.number, visibility);
            let (methods, properties) = class_members(lines, i, end, language);
            let class = out.class_mut(name, line.number, visibility);
            class.methods = methods;
            class.properties = properties;
            i = end + 1;
            continue;
        }

        if let Some(caps) = DEF.captures(code) {
            let name_match = caps.get(2);
            let name = name_match.map_or("", |m| m.as_str());
            let end = block_end_indented(lines, i);
            let visibility = naming_visibility(name);
            let params = parse_params(
                &params_after(lines, i, name_match.map_or(0, |m| m.end())),
                ParamStyle::LastWord,
            );
            out.symbol(name, SymbolKind::Function, line.number, visibility);
            out.functions.push(function_at(
                lines,
                i,
                end,
                name,
                params,
                visibility,
                caps.get(1).is_some(),
                language,
            ));
            i = end + 1;
            continue;
        }

        if line.indent == 0 {
            if let Some(caps) = ASSIGN.captures(code) {
                let name = &caps[1];
                out.symbol(
                    name,
                    SymbolKind::Variable,
                    line.number,
                    naming_visibility(name),
                );
            }
        }

        i += 1;
    }

    out
}

/// Leading underscore marks a private name; dunder names are public.
fn naming_visibility(name: &str) -> Visibility {
    let dunder = name.len() > 4 && name.starts_with("__") && name.ends_with("__");
    if name.starts_with('_') && !dunder {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn class_members(
    lines: &[CodeLine],
    start: usize,
    end: usize,
    language: Language,
) -> (Vec<FunctionInfo>, Vec<String>) {
    let mut methods = Vec::new();
    let mut properties: Vec<String> = Vec::new();
    if end <= start {
        return (methods, properties);
    }
    let member_indent = lines[start + 1].indent;

    let mut j = start + 1;
    while j <= end {
        let line = &lines[j];
        if line.indent == member_indent {
            if let Some(caps) = DEF.captures(&line.code) {
                let name_match = caps.get(2);
                let name = name_match.map_or("", |m| m.as_str());
                let mend = block_end_indented(lines, j).min(end);
                let params = parse_params(
                    &params_after(lines, j, name_match.map_or(0, |m| m.end())),
                    ParamStyle::LastWord,
                );
                for attr in lines[j..=mend]
                    .iter()
                    .flat_map(|l| SELF_ATTR.captures_iter(&l.code))
                {
                    let attr = attr[1].to_string();
                    if !properties.contains(&attr) {
                        properties.push(attr);
                    }
                }
                methods.push(function_at(
                    lines,
                    j,
                    mend,
                    name,
                    params,
                    naming_visibility(name),
                    caps.get(1).is_some(),
                    language,
                ));
                j = mend + 1;
                continue;
            }
            if let Some(caps) = ASSIGN.captures(&line.code) {
                let name = caps[1].to_string();
                if !properties.contains(&name) {
                    properties.push(name);
                }
            }
        }
        j += 1;
    }

    (methods, properties)
}

fn extract_modules(lines: &[CodeLine], out: &mut Extraction) {
    for line in lines {
        let code = line.code.trim_end();
        if let Some(caps) = FROM_IMPORT.captures(code) {
            let names = caps[2].trim().trim_start_matches('(').trim_end_matches(')');
            out.import(&caps[1], parse_name_list(names), ImportKind::Import, line.number);
        } else if let Some(caps) = IMPORT.captures(code) {
            for part in caps[1].split(',') {
                if let Some(module) = part.split_whitespace().next() {
                    out.import(module, Vec::new(), ImportKind::Import, line.number);
                }
            }
        } else if line.indent == 0 {
            if let Some(caps) = ALL_LIST.captures(code) {
                for name in QUOTED.captures_iter(&caps[1]) {
                    out.export(&name[1], line.number, false, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lines::code_lines;

    fn run(src: &str) -> Extraction {
        extract(&code_lines(src, Language::Python), Language::Python)
    }

    #[test]
    fn test_classes_and_methods() {
        let ex = run(
            "class Cache:\n    ttl = 30\n\n    def __init__(self, size):\n        self.size = size\n        self._items = {}\n\n    @classmethod\n    def instance(cls):\n        return cls(10)\n\n    def _evict(self):\n        if self.size > 0 and self._items:\n            pass\n",
        );
        assert_eq!(ex.classes.len(), 1);
        let class = &ex.classes[0];
        let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["__init__", "instance", "_evict"]);
        assert_eq!(class.methods[0].params, vec!["size"]);
        assert!(class.methods[1].params.is_empty());
        assert_eq!(class.methods[2].visibility, Visibility::Private);
        assert_eq!(class.methods[2].complexity, 3);
        assert_eq!(class.properties, vec!["ttl", "size", "_items"]);
    }

    #[test]
    fn test_functions_and_variables() {
        let ex = run(
            "MAX = 3\n_cache = None\n\nasync def fetch(url, *args, timeout: int = 5, **kw):\n    def inner():\n        pass\n    return 1\n",
        );
        assert_eq!(ex.functions.len(), 1);
        assert!(ex.functions[0].is_async);
        assert_eq!(ex.functions[0].params, vec!["url", "args", "timeout", "kw"]);
        let vars: Vec<_> = ex
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Variable)
            .map(|s| (s.name.as_str(), s.visibility))
            .collect();
        assert_eq!(
            vars,
            vec![("MAX", Visibility::Public), ("_cache", Visibility::Private)]
        );
    }

    #[test]
    fn test_imports_and_all() {
        let ex = run(
            "import os, sys as system\nfrom .models import User, Group as G\nfrom ..util import (helper)\n__all__ = ['User', \"helper\"]\n",
        );
        let modules: Vec<_> = ex.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["os", "sys", ".models", "..util"]);
        assert_eq!(ex.imports[2].specifiers, vec!["User", "Group"]);
        assert_eq!(ex.imports[3].specifiers, vec!["helper"]);
        let exports: Vec<_> = ex.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(exports, vec!["User", "helper"]);
    }
}
