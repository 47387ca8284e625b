//! Name-based design and anti-pattern recognition.
//!
//! These are shape heuristics over extracted declarations, not syntax-tree
//! analysis. A match is a candidate for review.

use super::models::{DetectedPattern, PatternKind};
use super::thresholds::AnalyticsThresholds;
use crate::analyzer::{FileAnalysis, FunctionInfo};

const INSTANCE_ACCESSORS: &[&str] = &["getinstance", "instance", "shared", "sharedinstance"];
const SUBSCRIBE_PREFIXES: &[&str] = &[
    "subscribe",
    "addlistener",
    "addeventlistener",
    "addobserver",
    "attach",
    "register",
];
const NOTIFY_PREFIXES: &[&str] = &["notify", "emit", "publish", "dispatch", "trigger", "broadcast"];
const FACTORY_PREFIXES: &[&str] = &["create", "make"];

/// Lowercased with underscores removed, so `get_instance` equals `getInstance`.
fn normalized(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn starts_with_any(name: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p))
}

fn is_subscriber(name: &str) -> bool {
    name == "on" || starts_with_any(name, SUBSCRIBE_PREFIXES)
}

fn has_observer_shape(functions: &[FunctionInfo]) -> bool {
    let names: Vec<String> = functions.iter().map(|f| normalized(&f.name)).collect();
    names.iter().any(|n| is_subscriber(n)) && names.iter().any(|n| starts_with_any(n, NOTIFY_PREFIXES))
}

fn factory_functions(functions: &[FunctionInfo]) -> usize {
    functions
        .iter()
        .filter(|f| starts_with_any(&normalized(&f.name), FACTORY_PREFIXES))
        .count()
}

/// Patterns in one file: class-level findings, then file-level, then per function.
#[must_use]
pub fn detect_patterns(analysis: &FileAnalysis, t: &AnalyticsThresholds) -> Vec<DetectedPattern> {
    let mut patterns = Vec::new();
    let mut push = |name: &str, kind: PatternKind, location: &str, line: usize, description: String| {
        patterns.push(DetectedPattern {
            path: analysis.path.clone(),
            name: name.to_string(),
            kind,
            location: location.to_string(),
            line,
            description,
        });
    };

    for class in &analysis.classes {
        let accessor = class.methods.iter().find(|m| {
            m.params.is_empty() && INSTANCE_ACCESSORS.contains(&normalized(&m.name).as_str())
        });
        if let Some(accessor) = accessor {
            push(
                "singleton",
                PatternKind::DesignPattern,
                &class.name,
                class.line,
                format!("'{}' exposes the instance accessor '{}'", class.name, accessor.name),
            );
        }

        if has_observer_shape(&class.methods) {
            push(
                "observer",
                PatternKind::DesignPattern,
                &class.name,
                class.line,
                format!("'{}' pairs subscribe and notify methods", class.name),
            );
        }

        if class.name.contains("Factory") || factory_functions(&class.methods) >= t.factory_functions {
            push(
                "factory",
                PatternKind::DesignPattern,
                &class.name,
                class.line,
                format!("'{}' creates objects by name", class.name),
            );
        }

        if class.methods.len() > t.god_class_methods && class.properties.len() > t.god_class_properties {
            push(
                "god_class",
                PatternKind::AntiPattern,
                &class.name,
                class.line,
                format!(
                    "'{}' has {} methods and {} properties",
                    class.name,
                    class.methods.len(),
                    class.properties.len()
                ),
            );
        }
    }

    let module = analysis
        .path
        .file_name()
        .map_or_else(|| analysis.path.display().to_string(), |n| n.to_string_lossy().into_owned());

    if has_observer_shape(&analysis.functions) {
        push(
            "observer",
            PatternKind::DesignPattern,
            &module,
            1,
            "Module pairs subscribe and notify functions".to_string(),
        );
    }
    if factory_functions(&analysis.functions) >= t.factory_functions {
        push(
            "factory",
            PatternKind::DesignPattern,
            &module,
            1,
            "Module exposes several create/make functions".to_string(),
        );
    }

    for function in analysis.all_functions() {
        if function.params.len() > t.long_parameter_list {
            push(
                "long_parameter_list",
                PatternKind::AntiPattern,
                &function.name,
                function.line,
                format!("'{}' takes {} parameters", function.name, function.params.len()),
            );
        }
    }

    patterns
}
