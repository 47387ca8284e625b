//! Go declarations. Capitalized names are exported.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    block_end_braced, brace_delta, function_at, params_after, parse_params, Extraction,
    ParamStyle,
};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{ImportKind, SymbolKind, Visibility};

static FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s+(?:\(\s*(?:\w+\s+)?\*?\s*([A-Za-z_]\w*)(?:\[[^\]]*\])?\s*\)\s*)?([A-Za-z_]\w*)")
        .expect("valid regex")
});

static TYPE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^type\s+([A-Za-z_]\w*)(?:\[[^\]]*\])?\s+(struct|interface)\b").expect("valid regex")
});

static VAR_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:var|const)\s+([A-Za-z_]\w*)").expect("valid regex"));

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s+[\w*\[\]{}.]").expect("valid regex")
});

static IMPORT_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).expect("valid regex"));

static IMPORT_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:[\w.]+\s+)?"([^"]+)""#).expect("valid regex"));

fn go_visibility(name: &str) -> Visibility {
    if name.chars().next().is_some_and(char::is_uppercase) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();
    extract_imports(lines, &mut out);

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let code = line.code.as_str();

        if let Some(caps) = TYPE_DECL.captures(code) {
            let name = &caps[1];
            let visibility = go_visibility(name);
            let end = block_end_braced(lines, i);
            if visibility == Visibility::Public {
                out.export(name, line.number, false, None);
            }
            if &caps[2] == "struct" {
                out.symbol(name, SymbolKind::Struct, line.number, visibility);
                let fields = struct_fields(lines, i, end);
                let class = out.class_mut(name, line.number, visibility);
                class.line = line.number;
                class.visibility = visibility;
                class.properties = fields;
            } else {
                out.symbol(name, SymbolKind::Interface, line.number, visibility);
            }
            i = end + 1;
            continue;
        }

        if let Some(caps) = FUNC.captures(code) {
            let name_match = caps.get(2);
            let name = name_match.map_or("", |m| m.as_str());
            let visibility = go_visibility(name);
            let end = block_end_braced(lines, i);
            let params = parse_params(
                &params_after(lines, i, name_match.map_or(0, |m| m.end())),
                ParamStyle::FirstWord,
            );
            let info = function_at(lines, i, end, name, params, visibility, false, language);
            match caps.get(1) {
                Some(receiver) => {
                    let class = out.class_mut(receiver.as_str(), line.number, go_visibility(receiver.as_str()));
                    class.methods.push(info);
                }
                None => {
                    out.symbol(name, SymbolKind::Function, line.number, visibility);
                    if visibility == Visibility::Public {
                        out.export(name, line.number, false, None);
                    }
                    out.functions.push(info);
                }
            }
            i = end + 1;
            continue;
        }

        if let Some(caps) = VAR_DECL.captures(code) {
            let name = &caps[1];
            out.symbol(name, SymbolKind::Variable, line.number, go_visibility(name));
        }

        i += 1;
    }

    out
}

fn struct_fields(lines: &[CodeLine], start: usize, end: usize) -> Vec<String> {
    let mut fields = Vec::new();
    let mut depth = brace_delta(&lines[start].bare);
    for line in lines.iter().take(end).skip(start + 1) {
        if depth == 1 {
            if let Some(caps) = FIELD.captures(&line.code) {
                fields.extend(caps[1].split(',').map(|f| f.trim().to_string()));
            }
        }
        depth += brace_delta(&line.bare);
    }
    fields
}

fn extract_imports(lines: &[CodeLine], out: &mut Extraction) {
    let mut in_block = false;
    for line in lines {
        let code = line.code.trim();
        if in_block {
            if code.starts_with(')') {
                in_block = false;
            } else if let Some(caps) = IMPORT_SPEC.captures(code) {
                out.import(&caps[1], Vec::new(), ImportKind::Import, line.number);
            }
            continue;
        }
        if code.starts_with("import") && code.ends_with('(') {
            in_block = true;
        } else if let Some(caps) = IMPORT_SINGLE.captures(code) {
            out.import(&caps[1], Vec::new(), ImportKind::Import, line.number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lines::code_lines;

    fn run(src: &str) -> Extraction {
        extract(&code_lines(src, Language::Go), Language::Go)
    }

    #[test]
    fn test_structs_methods_and_functions() {
        let ex = run(
            "package store\n\ntype Store struct {\n\tName string\n\ta, b int\n}\n\nfunc (s *Store) Get(key string) string {\n\tif key == \"\" {\n\t\treturn \"\"\n\t}\n\treturn s.Name\n}\n\nfunc helper(a, b int) int {\n\treturn a + b\n}\n",
        );
        assert_eq!(ex.classes.len(), 1);
        let class = &ex.classes[0];
        assert_eq!(class.name, "Store");
        assert_eq!(class.properties, vec!["Name", "a", "b"]);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "Get");
        assert_eq!(class.methods[0].visibility, Visibility::Public);
        assert_eq!(class.methods[0].complexity, 2);
        assert_eq!(ex.functions.len(), 1);
        assert_eq!(ex.functions[0].params, vec!["a", "b"]);
        assert_eq!(ex.functions[0].visibility, Visibility::Private);
        let exports: Vec<_> = ex.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(exports, vec!["Store"]);
    }

    #[test]
    fn test_imports() {
        let ex = run("import \"fmt\"\nimport (\n\t\"os\"\n\tlog \"github.com/sirupsen/logrus\"\n)\n");
        let modules: Vec<_> = ex.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["fmt", "os", "github.com/sirupsen/logrus"]);
    }
}
