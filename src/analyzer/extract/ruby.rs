//! Ruby declarations.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{block_end_indented, function_at, params_after, parse_params, Extraction, ParamStyle};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{FunctionInfo, ImportKind, SymbolKind, Visibility};

static DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(private\s+|protected\s+|public\s+)?def\s+(?:self\.)?([A-Za-z_]\w*[?!=]?)")
        .expect("valid regex")
});

static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*class\s+((?:[A-Z]\w*::)*)([A-Z]\w*)").expect("valid regex")
});

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*attr_(?:accessor|reader|writer)\s+(.+)$").expect("valid regex")
});

static SYMBOL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\w+)").expect("valid regex"));

static IVAR_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z_]\w*)\s*(?:\|\|)?=[^=]").expect("valid regex"));

static ACCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(private|protected|public)\s*$").expect("valid regex"));

static CONSTANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9_]*)\s*=[^=]").expect("valid regex"));

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:require|require_relative|load)\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("valid regex")
});

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();

    for line in lines {
        if let Some(caps) = REQUIRE.captures(&line.code) {
            out.import(&caps[1], Vec::new(), ImportKind::Require, line.number);
        }
    }

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let code = line.code.as_str();

        if let Some(caps) = CLASS.captures(code) {
            let name = &caps[2];
            let end = block_end_indented(lines, i);
            out.symbol(name, SymbolKind::Class, line.number, Visibility::Public);
            let (methods, properties) = class_members(lines, i, end, language);
            let class = out.class_mut(name, line.number, Visibility::Public);
            class.methods.extend(methods);
            for property in properties {
                if !class.properties.contains(&property) {
                    class.properties.push(property);
                }
            }
            i = end + 1;
            continue;
        }

        if let Some(caps) = DEF.captures(code) {
            let end = block_end_indented(lines, i);
            let info = method_at(lines, i, end, &caps, Visibility::Public, language);
            out.symbol(&info.name, SymbolKind::Function, line.number, info.visibility);
            out.functions.push(info);
            i = end + 1;
            continue;
        }

        if let Some(caps) = CONSTANT.captures(code) {
            out.symbol(&caps[1], SymbolKind::Variable, line.number, Visibility::Public);
        }

        // `module` bodies and everything else are scanned through.
        i += 1;
    }

    out
}

fn method_at(
    lines: &[CodeLine],
    start: usize,
    end: usize,
    caps: &regex::Captures<'_>,
    default: Visibility,
    language: Language,
) -> FunctionInfo {
    let name = caps.get(2).map_or("", |m| m.as_str());
    let name_end = caps.get(2).map_or(0, |m| m.end());
    let rest = lines[start].code.get(name_end..).unwrap_or("").trim_start();
    let raw = if rest.starts_with('(') {
        params_after(lines, start, name_end)
    } else {
        rest.to_string()
    };
    let visibility = match caps.get(1).map(|m| m.as_str().trim()) {
        Some("private" | "protected") => Visibility::Private,
        Some(_) => Visibility::Public,
        None => default,
    };
    function_at(
        lines,
        start,
        end,
        name,
        parse_params(&raw, ParamStyle::LastWord),
        visibility,
        false,
        language,
    )
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
    let mut visibility = Visibility::Public;

    let mut j = start + 1;
    while j <= end {
        let line = &lines[j];
        if line.indent == member_indent {
            if let Some(caps) = ACCESS.captures(&line.code) {
                visibility = if &caps[1] == "public" {
                    Visibility::Public
                } else {
                    Visibility::Private
                };
            } else if let Some(caps) = ATTR.captures(&line.code) {
                for name in SYMBOL_NAME.captures_iter(&caps[1]) {
                    let name = name[1].to_string();
                    if !properties.contains(&name) {
                        properties.push(name);
                    }
                }
            } else if let Some(caps) = DEF.captures(&line.code) {
                let mend = block_end_indented(lines, j).min(end);
                for ivar in lines[j..=mend]
                    .iter()
                    .flat_map(|l| IVAR_ASSIGN.captures_iter(&l.code))
                {
                    let ivar = ivar[1].to_string();
                    if !properties.contains(&ivar) {
                        properties.push(ivar);
                    }
                }
                methods.push(method_at(lines, j, mend, &caps, visibility, language));
                j = mend + 1;
                continue;
            }
        }
        j += 1;
    }

    (methods, properties)
}
