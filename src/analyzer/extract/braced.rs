//! Brace languages with modifier-prefixed declarations: Java, C#, Kotlin,
//! Scala, Swift, PHP, C and C++.
//!
//! Declarations are recognized one scope at a time. Class bodies are scanned
//! recursively so that methods and properties attach to their enclosing type.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    block_end_braced, brace_delta, function_at, is_control_word, params_after, parse_name_list,
    parse_params, Extraction, ParamStyle,
};
use crate::analyzer::language::Language;
use crate::analyzer::lines::CodeLine;
use crate::analyzer::models::{ClassInfo, FunctionInfo, ImportKind, SymbolKind, Visibility};

static TYPE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:(?:public|private|protected|internal|fileprivate|open|static|final|abstract|sealed|partial|data|inner|readonly|export|enum|case|annotation|@\w+)\s+)*)(class|record|object|interface|trait|protocol|enum|struct)\s+([A-Za-z_]\w*)",
    )
    .expect("valid regex")
});

static KEYWORD_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:[@A-Za-z]\w*(?:\([^)]*\))?\s+)*?)(?:fun|func|function|def)\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?([A-Za-z_]\w*)\s*[(<\[:=]",
    )
    .expect("valid regex")
});

static TYPED_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:(?:public|private|protected|internal|static|final|abstract|virtual|override|async|synchronized|native|inline|extern|const|constexpr|unsafe|sealed|explicit|friend|partial|default|unsigned|signed|long|short|struct)\s+)*)(?:<[^()]*>\s+)?((?:[\w:]+(?:<[^()]*?>)?(?:\[\])*\??[\s*&]+)?)((?:[A-Za-z_]\w*::)*)(~?[A-Za-z_]\w*)\s*(?:<[^()]*>)?\s*\(",
    )
    .expect("valid regex")
});

static FIELD_TYPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|internal|static|final|readonly|const|volatile|transient|mutable|required|unsigned|signed|long|short|struct)\s+)*[\w:.]+(?:<[^;=()]*>)?(?:\[\])*\??[\s*&]+([A-Za-z_]\w*)\s*(?:[=;{,\[]|$)",
    )
    .expect("valid regex")
});

static FIELD_DECLARED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[@A-Za-z]\w*\s+)*?(?:val|var|let)\s+([A-Za-z_]\w*)").expect("valid regex")
});

static FIELD_PHP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|readonly|var)\s+)+(?:\??[\w\\]+\s+)?\$([A-Za-z_]\w*)",
    )
    .expect("valid regex")
});

static ACCESS_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(public|private|protected)\s*:\s*$").expect("valid regex"));

static IMPORT_DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:@\w+\s+)?import\s+(?:static\s+)?([\w.]+)(?:\.\{([^}]*)\})?")
        .expect("valid regex")
});

static USING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:global\s+)?using\s+(?:static\s+)?(?:\w+\s*=\s*)?([\w.]+)\s*;")
        .expect("valid regex")
});

static INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*[<"]([^>"]+)[>"]"#).expect("valid regex"));

static PHP_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("valid regex")
});

static PHP_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*use\s+([\w\\]+)(?:\s+as\s+\w+)?\s*;").expect("valid regex")
});

/// Leading words that make a line a statement rather than a field.
const STATEMENT_WORDS: &[&str] = &["typedef", "friend", "package", "namespace", "import"];

pub(super) fn extract(lines: &[CodeLine], language: Language) -> Extraction {
    let mut out = Extraction::default();
    extract_modules(lines, language, &mut out);
    scan(lines, 0, lines.len(), None, Visibility::Public, language, &mut out);
    out
}

fn has_word(text: &str, word: &str) -> bool {
    text.split_whitespace().any(|w| w == word)
}

fn is_c_like(language: Language) -> bool {
    matches!(language, Language::C | Language::Cpp)
}

/// Visibility named by a modifier list, if any.
fn explicit_visibility(modifiers: &str) -> Option<Visibility> {
    modifiers.split_whitespace().find_map(|w| match w {
        "private" | "protected" | "fileprivate" => Some(Visibility::Private),
        "public" | "internal" | "open" => Some(Visibility::Public),
        _ => None,
    })
}

fn member_default(language: Language) -> Visibility {
    match language {
        Language::Kotlin | Language::Scala | Language::Swift | Language::Php => Visibility::Public,
        _ => Visibility::Private,
    }
}

fn top_level_default(language: Language) -> Visibility {
    match language {
        Language::Java | Language::CSharp => Visibility::Private,
        _ => Visibility::Public,
    }
}

struct TypeDecl<'a> {
    name: &'a str,
    kind: SymbolKind,
    explicit: Option<Visibility>,
}

fn type_decl(line: &CodeLine, language: Language) -> Option<TypeDecl<'_>> {
    let caps = TYPE_DECL.captures(&line.code)?;
    let name = caps.get(3)?;
    let modifiers = caps.get(1).map_or("", |m| m.as_str());

    if is_c_like(language) {
        let rest = &line.code[name.end()..];
        // Forward declarations, variables of struct type and functions returning one.
        let forward = line.bare.trim_end().ends_with(';') && !line.bare.contains('{');
        if forward || rest.contains('(') || rest.trim_start().starts_with('*') {
            return None;
        }
    }

    let kind = if has_word(modifiers, "enum") {
        SymbolKind::Enum
    } else {
        match &caps[2] {
            "interface" | "trait" | "protocol" => SymbolKind::Interface,
            "enum" => SymbolKind::Enum,
            "struct" => SymbolKind::Struct,
            _ => SymbolKind::Class,
        }
    };

    Some(TypeDecl {
        name: name.as_str(),
        kind,
        explicit: explicit_visibility(modifiers),
    })
}

struct FnDecl<'a> {
    name: &'a str,
    name_end: usize,
    qualifier: Option<&'a str>,
    explicit: Option<Visibility>,
    is_async: bool,
}

fn keyword_functions(language: Language) -> bool {
    matches!(
        language,
        Language::Kotlin | Language::Scala | Language::Swift | Language::Php
    )
}

fn function_decl<'a>(
    line: &'a CodeLine,
    language: Language,
    owner: Option<&str>,
) -> Option<FnDecl<'a>> {
    let code = line.code.as_str();

    if keyword_functions(language) {
        let caps = KEYWORD_FN.captures(code)?;
        let modifiers = caps.get(1).map_or("", |m| m.as_str());
        if modifiers.split_whitespace().any(is_control_word) {
            return None;
        }
        let name = caps.get(2)?;
        return Some(FnDecl {
            name: name.as_str(),
            name_end: name.end(),
            qualifier: None,
            explicit: explicit_visibility(modifiers),
            is_async: has_word(modifiers, "suspend")
                || has_word(modifiers, "async")
                || code.contains(") async"),
        });
    }

    if owner.is_none() && !is_c_like(language) {
        return None;
    }

    let caps = TYPED_FN.captures(code)?;
    let modifiers = caps.get(1).map_or("", |m| m.as_str());
    let return_type = caps.get(2).map_or("", |m| m.as_str().trim());
    let qualifier = caps
        .get(3)
        .map(|m| m.as_str().trim_end_matches("::"))
        .filter(|q| !q.is_empty())
        .and_then(|q| q.rsplit("::").next());
    let name = caps.get(4)?;

    let first_word = code.split_whitespace().next().unwrap_or("");
    let return_word = return_type.split_whitespace().next().unwrap_or("");
    if is_control_word(name.as_str())
        || is_control_word(first_word)
        || is_control_word(return_word)
        || first_word == "else"
    {
        return None;
    }

    let is_constructor = owner.is_some_and(|o| o == name.as_str().trim_start_matches('~'));
    if modifiers.trim().is_empty() && return_type.is_empty() && !is_constructor {
        return None;
    }

    let mut explicit = explicit_visibility(modifiers);
    if owner.is_none() && qualifier.is_none() && explicit.is_none() {
        explicit = Some(if has_word(modifiers, "static") {
            Visibility::Private
        } else {
            Visibility::Public
        });
    }

    Some(FnDecl {
        name: name.as_str(),
        name_end: name.end(),
        qualifier,
        explicit,
        is_async: has_word(modifiers, "async"),
    })
}

fn property_decl(line: &CodeLine, language: Language) -> Option<&str> {
    let code = line.code.as_str();
    let caps = match language {
        Language::Kotlin | Language::Scala | Language::Swift => FIELD_DECLARED.captures(code)?,
        Language::Php => FIELD_PHP.captures(code)?,
        _ => {
            let first = code.split_whitespace().next().unwrap_or("");
            if is_control_word(first) || STATEMENT_WORDS.contains(&first) {
                return None;
            }
            FIELD_TYPED.captures(code)?
        }
    };
    caps.get(1).map(|m| m.as_str())
}

/// Replace a declared method with its out-of-line definition, or add it.
fn attach_definition(class: &mut ClassInfo, mut info: FunctionInfo) {
    match class
        .methods
        .iter_mut()
        .find(|m| m.name == info.name && m.params.len() == info.params.len())
    {
        Some(existing) => {
            info.visibility = existing.visibility;
            *existing = info;
        }
        None => class.methods.push(info),
    }
}

/// Scan `lines[from..to]`. With an `owner`, only depth-zero lines are
/// members of that type; at file level declarations are found at any depth
/// so namespace and package blocks are transparent.
#[allow(clippy::too_many_arguments)]
fn scan(
    lines: &[CodeLine],
    from: usize,
    to: usize,
    owner: Option<&str>,
    member_visibility: Visibility,
    language: Language,
    out: &mut Extraction,
) {
    let mut section = member_visibility;
    let mut depth = 0i32;
    let mut i = from;

    while i < to {
        let line = &lines[i];

        if owner.is_some() && depth != 0 {
            depth += brace_delta(&line.bare);
            i += 1;
            continue;
        }

        if owner.is_some() && language == Language::Cpp {
            if let Some(caps) = ACCESS_SECTION.captures(&line.code) {
                section = explicit_visibility(&caps[1]).unwrap_or(section);
                i += 1;
                continue;
            }
        }

        let default_visibility = if owner.is_some() {
            section
        } else {
            top_level_default(language)
        };

        if let Some(decl) = type_decl(line, language) {
            let end = block_end_braced(lines, i).min(to - 1);
            let visibility = decl.explicit.unwrap_or(default_visibility);
            out.symbol(decl.name, decl.kind, line.number, visibility);
            if owner.is_none() && visibility == Visibility::Public {
                out.export(decl.name, line.number, false, None);
            }
            if matches!(decl.kind, SymbolKind::Class | SymbolKind::Struct) {
                out.class_mut(decl.name, line.number, visibility);
                let members = if decl.kind == SymbolKind::Struct && is_c_like(language) {
                    Visibility::Public
                } else {
                    member_default(language)
                };
                scan(lines, i + 1, end, Some(decl.name), members, language, out);
            }
            i = end + 1;
            continue;
        }

        if let Some(func) = function_decl(line, language, owner) {
            let bare = line.bare.trim_end();
            let bodiless = !bare.contains('{') && (bare.contains('=') || bare.ends_with(';'));
            if owner.is_none() && func.qualifier.is_none() && bare.ends_with(';') {
                // Prototype.
                i += 1;
                continue;
            }
            let end = if bodiless {
                i
            } else {
                block_end_braced(lines, i).min(to - 1)
            };
            let params = parse_params(
                &params_after(lines, i, func.name_end),
                ParamStyle::LastWord,
            );
            let visibility = func.explicit.unwrap_or(default_visibility);
            let info = function_at(
                lines,
                i,
                end,
                func.name,
                params,
                visibility,
                func.is_async,
                language,
            );

            match (owner, func.qualifier) {
                (Some(owner), _) => {
                    out.class_mut(owner, line.number, Visibility::Public)
                        .methods
                        .push(info);
                }
                (None, Some(qualifier)) => {
                    attach_definition(out.class_mut(qualifier, line.number, Visibility::Public), info);
                }
                (None, None) => {
                    out.symbol(func.name, SymbolKind::Function, line.number, visibility);
                    if visibility == Visibility::Public {
                        out.export(func.name, line.number, false, None);
                    }
                    out.functions.push(info);
                }
            }
            i = end + 1;
            continue;
        }

        if let Some(owner) = owner {
            if let Some(name) = property_decl(line, language) {
                let class = out.class_mut(owner, line.number, Visibility::Public);
                if !class.properties.iter().any(|p| p == name) {
                    class.properties.push(name.to_string());
                }
            }
        }

        depth += brace_delta(&line.bare);
        i += 1;
    }
}

fn extract_modules(lines: &[CodeLine], language: Language, out: &mut Extraction) {
    for line in lines {
        let code = line.code.as_str();
        match language {
            Language::C | Language::Cpp => {
                if let Some(caps) = INCLUDE.captures(code) {
                    out.import(&caps[1], Vec::new(), ImportKind::Import, line.number);
                }
            }
            Language::CSharp => {
                if let Some(caps) = USING.captures(code) {
                    out.import(&caps[1], Vec::new(), ImportKind::Import, line.number);
                }
            }
            Language::Php => {
                if let Some(caps) = PHP_REQUIRE.captures(code) {
                    out.import(&caps[1], Vec::new(), ImportKind::Require, line.number);
                } else if let Some(caps) = PHP_USE.captures(code) {
                    let module = &caps[1];
                    let specifiers = module
                        .rsplit('\\')
                        .next()
                        .map(|s| vec![s.to_string()])
                        .unwrap_or_default();
                    out.import(module, specifiers, ImportKind::Import, line.number);
                }
            }
            _ => {
                if let Some(caps) = IMPORT_DOTTED.captures(code) {
                    let module = caps[1].trim_end_matches('.');
                    let specifiers = caps
                        .get(2)
                        .map(|list| parse_name_list(list.as_str()))
                        .unwrap_or_default();
                    out.import(module, specifiers, ImportKind::Import, line.number);
                }
            }
        }
    }
}
