//! Rust declarations. Methods in `impl` blocks attach to their type.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    block_end_braced, brace_delta, function_at, params_after, parse_params, Extraction,
    ParamStyle,
};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{ImportKind, SymbolKind, Visibility};

const VIS: &str = r"(pub(?:\s*\([^)]*\))?\s+)?";

static FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^\s*{VIS}(?:default\s+)?(?:const\s+)?(async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#
    ))
    .expect("valid regex")
});

static STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}(?:struct|union)\s+([A-Za-z_]\w*)")).expect("valid regex")
});

static ENUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}enum\s+([A-Za-z_]\w*)")).expect("valid regex")
});

static TRAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}(?:unsafe\s+)?trait\s+([A-Za-z_]\w*)")).expect("valid regex")
});

static IMPL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:unsafe\s+)?impl(?:<.*?>)?\s+(?:[\w:]+(?:<.*?>)?\s+for\s+)?(?:[\w]+::)*([A-Za-z_]\w*)")
        .expect("valid regex")
});

static CONST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}(?:const|static)\s+(?:mut\s+)?([A-Za-z_]\w*)\s*:"))
        .expect("valid regex")
});

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}([a-z_]\w*)\s*:[^:]")).expect("valid regex")
});

static USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}use\s+([^;{{]+?)(?:::\{{([^}}]*)\}}?)?\s*;?\s*$"))
        .expect("valid regex")
});

static MOD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{VIS}mod\s+([A-Za-z_]\w*)\s*;")).expect("valid regex")
});

static EXTERN_CRATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*extern\s+crate\s+([A-Za-z_]\w*)").expect("valid regex"));

const fn pub_visibility(is_pub: bool) -> Visibility {
    if is_pub {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();
    let mut depth = 0i32;
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        let code = line.code.as_str();

        if extract_module_ref(line, depth, &mut out) {
            depth += brace_delta(&line.bare);
            i += 1;
            continue;
        }

        if let Some(caps) = STRUCT.captures(code) {
            let name = &caps[2];
            let visibility = pub_visibility(caps.get(1).is_some());
            let end = block_end_braced(lines, i);
            out.symbol(name, SymbolKind::Struct, line.number, visibility);
            if depth == 0 && visibility == Visibility::Public {
                out.export(name, line.number, false, None);
            }
            let fields = struct_fields(lines, i, end);
            let class = out.class_mut(name, line.number, visibility);
            class.line = line.number;
            class.visibility = visibility;
            class.properties = fields;
            i = end + 1;
            continue;
        }

        if let Some(caps) = ENUM.captures(code) {
            let visibility = pub_visibility(caps.get(1).is_some());
            out.symbol(&caps[2], SymbolKind::Enum, line.number, visibility);
            if depth == 0 && visibility == Visibility::Public {
                out.export(&caps[2], line.number, false, None);
            }
            i = block_end_braced(lines, i) + 1;
            continue;
        }

        if let Some(caps) = TRAIT.captures(code) {
            let visibility = pub_visibility(caps.get(1).is_some());
            out.symbol(&caps[2], SymbolKind::Interface, line.number, visibility);
            if depth == 0 && visibility == Visibility::Public {
                out.export(&caps[2], line.number, false, None);
            }
            i = block_end_braced(lines, i) + 1;
            continue;
        }

        if let Some(caps) = IMPL.captures(code) {
            let target = caps[1].to_string();
            let end = block_end_braced(lines, i);
            impl_methods(lines, i, end, &target, language, &mut out);
            i = end + 1;
            continue;
        }

        if let Some(caps) = FN.captures(code) {
            let name_match = caps.get(3);
            let name = name_match.map_or("", |m| m.as_str());
            let visibility = pub_visibility(caps.get(1).is_some());
            let end = block_end_braced(lines, i);
            let params = parse_params(
                &params_after(lines, i, name_match.map_or(0, |m| m.end())),
                ParamStyle::LastWord,
            );
            out.symbol(name, SymbolKind::Function, line.number, visibility);
            if depth == 0 && visibility == Visibility::Public {
                out.export(name, line.number, false, None);
            }
            out.functions.push(function_at(
                lines,
                i,
                end,
                name,
                params,
                visibility,
                caps.get(2).is_some(),
                language,
            ));
            i = end + 1;
            continue;
        }

        if depth == 0 {
            if let Some(caps) = CONST.captures(code) {
                out.symbol(
                    &caps[2],
                    SymbolKind::Variable,
                    line.number,
                    pub_visibility(caps.get(1).is_some()),
                );
            }
        }

        depth += brace_delta(&line.bare);
        i += 1;
    }

    out
}

/// Record `use`, `mod x;` and `extern crate`. Returns true if the line was one.
fn extract_module_ref(line: &CodeLine, depth: i32, out: &mut Extraction) -> bool {
    let code = line.code.as_str();

    if let Some(caps) = USE.captures(code) {
        let path = caps[2].trim().trim_end_matches("::");
        let specifiers: Vec<String> = match caps.get(3) {
            Some(list) => list
                .as_str()
                .split(',')
                .filter_map(|s| s.split_whitespace().next())
                .map(|s| s.trim_matches(|c: char| c == '{' || c == '}').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => path.rsplit("::").next().map(str::to_string).into_iter().collect(),
        };
        let module = if caps.get(3).is_some() {
            path
        } else {
            path.rsplit_once("::").map_or(path, |(head, _)| head)
        };
        out.import(module, specifiers.clone(), ImportKind::Import, line.number);
        if caps.get(1).is_some() && depth == 0 {
            for name in specifiers {
                out.exports.push(crate::analyzer::models::ExportEntry {
                    name,
                    line: line.number,
                    is_default: false,
                    source: Some(module.to_string()),
                });
            }
        }
        return true;
    }

    if let Some(caps) = MOD_DECL.captures(code) {
        out.import(&caps[2], Vec::new(), ImportKind::Import, line.number);
        if caps.get(1).is_some() && depth == 0 {
            out.export(&caps[2], line.number, false, None);
        }
        return true;
    }

    if let Some(caps) = EXTERN_CRATE.captures(code) {
        out.import(&caps[1], Vec::new(), ImportKind::Import, line.number);
        return true;
    }

    false
}

fn struct_fields(lines: &[CodeLine], start: usize, end: usize) -> Vec<String> {
    let mut fields = Vec::new();
    let mut depth = brace_delta(&lines[start].bare);
    for line in lines.iter().take(end).skip(start + 1) {
        if depth == 1 {
            if let Some(caps) = FIELD.captures(&line.code) {
                fields.push(caps[2].to_string());
            }
        }
        depth += brace_delta(&line.bare);
    }
    fields
}

fn impl_methods(
    lines: &[CodeLine],
    start: usize,
    end: usize,
    target: &str,
    language: Language,
    out: &mut Extraction,
) {
    let mut methods = Vec::new();
    let mut depth = brace_delta(&lines[start].bare);
    let mut j = start + 1;

    while j < end {
        let line = &lines[j];
        if depth == 1 {
            if let Some(caps) = FN.captures(&line.code) {
                let name_match = caps.get(3);
                let name = name_match.map_or("", |m| m.as_str());
                let mend = block_end_braced(lines, j).min(end);
                let params = parse_params(
                    &params_after(lines, j, name_match.map_or(0, |m| m.end())),
                    ParamStyle::LastWord,
                );
                methods.push(function_at(
                    lines,
                    j,
                    mend,
                    name,
                    params,
                    pub_visibility(caps.get(1).is_some()),
                    caps.get(2).is_some(),
                    language,
                ));
                if mend == end {
                    break;
                }
                j = mend + 1;
                continue;
            }
        }
        depth += brace_delta(&line.bare);
        j += 1;
    }

    let class = out.class_mut(target, lines[start].number, Visibility::Private);
    class.methods.extend(methods);
}
