//! Code smell rules.

use std::path::Path;

use super::models::{CodeSmell, SmellKind, SmellSeverity};
use super::thresholds::AnalyticsThresholds;
use crate::analyzer::{FileAnalysis, FunctionInfo};

/// Severity from how far a value exceeds its threshold.
#[must_use]
pub fn smell_severity(ratio: f64, t: &AnalyticsThresholds) -> SmellSeverity {
    if ratio >= t.critical_multiple {
        SmellSeverity::Critical
    } else if ratio >= t.major_multiple {
        SmellSeverity::Major
    } else {
        SmellSeverity::Minor
    }
}

/// Smells in one file: functions and methods first, then classes.
#[must_use]
pub fn detect_smells(analysis: &FileAnalysis, t: &AnalyticsThresholds) -> Vec<CodeSmell> {
    let mut smells = Vec::new();

    for function in &analysis.functions {
        function_smells(&analysis.path, &function.name, function, t, &mut smells);
    }
    for class in &analysis.classes {
        for method in &class.methods {
            let name = format!("{}.{}", class.name, method.name);
            function_smells(&analysis.path, &name, method, t, &mut smells);
        }
    }

    for class in &analysis.classes {
        let methods = class.methods.len();
        if methods > t.large_class_methods {
            #[allow(clippy::cast_precision_loss)]
            let ratio = methods as f64 / t.large_class_methods as f64;
            smells.push(CodeSmell {
                path: analysis.path.clone(),
                kind: SmellKind::LargeClass,
                name: class.name.clone(),
                line: class.line,
                severity: smell_severity(ratio, t),
                message: format!("Class '{}' has {methods} methods", class.name),
                suggestion: "Extract cohesive groups of methods into separate classes".to_string(),
            });
        }
    }

    smells
}

#[allow(clippy::cast_precision_loss)]
fn function_smells(
    path: &Path,
    name: &str,
    function: &FunctionInfo,
    t: &AnalyticsThresholds,
    out: &mut Vec<CodeSmell>,
) {
    let params = function.params.len();
    let too_complex = function.complexity > t.long_method_complexity;
    let too_many_params = params > t.long_method_params;

    if too_complex || too_many_params {
        let ratio = (f64::from(function.complexity) / f64::from(t.long_method_complexity))
            .max(params as f64 / t.long_method_params as f64);
        out.push(CodeSmell {
            path: path.to_path_buf(),
            kind: SmellKind::LongMethod,
            name: name.to_string(),
            line: function.line,
            severity: smell_severity(ratio, t),
            message: format!(
                "'{name}' has complexity {} and {params} parameters",
                function.complexity
            ),
            suggestion: "Extract helper functions or group parameters into a struct".to_string(),
        });
    }

    if function.complexity > t.complex_conditional_complexity {
        let ratio =
            f64::from(function.complexity) / f64::from(t.complex_conditional_complexity);
        out.push(CodeSmell {
            path: path.to_path_buf(),
            kind: SmellKind::ComplexConditional,
            name: name.to_string(),
            line: function.line,
            severity: smell_severity(ratio, t),
            message: format!("'{name}' has {} branches", function.complexity - 1),
            suggestion: "Replace nested conditionals with early returns or lookup tables"
                .to_string(),
        });
    }
}
