//! Data models produced by file analysis.
//!
//! A [`FileAnalysis`] is a value object: it is created once per analysis call
//! and shared as `Arc<FileAnalysis>` afterwards. Re-analysis replaces it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;

/// Kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Struct,
    Enum,
    Variable,
}

/// Visibility inferred from export/public keywords or naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

/// A declared symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based line of the declaration.
    pub line: usize,
    pub visibility: Visibility,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
    pub params: Vec<String>,
    /// Complexity of the function body alone (baseline 1).
    pub complexity: u32,
    pub visibility: Visibility,
    pub is_async: bool,
}

/// A class-like declaration with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    pub methods: Vec<FunctionInfo>,
    pub properties: Vec<String>,
    pub visibility: Visibility,
}

/// How a module is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// Static `import`/`use`/`#include` statement.
    Import,
    /// `import(...)` expression.
    DynamicImport,
    /// `require(...)` call.
    Require,
}

/// A module reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub module: String,
    /// Imported names, if the statement lists them.
    pub specifiers: Vec<String>,
    pub kind: ImportKind,
    pub line: usize,
}

/// An exported name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub name: String,
    pub line: usize,
    pub is_default: bool,
    /// Source module for re-exports (`export { x } from './y'`).
    pub source: Option<String>,
}

/// Structural analysis of one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub language: Language,
    /// Size in bytes.
    pub size: u64,
    /// Lines that are neither blank nor comment-only.
    pub lines: usize,
    /// Heuristic cyclomatic-style complexity, always at least 1.
    pub complexity: u32,
    pub symbols: Vec<Symbol>,
    /// Referenced module identifiers in source order, first occurrence kept.
    pub dependencies: Vec<String>,
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub last_modified: DateTime<Utc>,
    /// `utf-8`, `utf-8-lossy` or `binary`.
    pub encoding: String,
    pub is_binary: bool,
}

impl FileAnalysis {
    /// Total method count across all classes.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    /// All functions including class methods.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }
}
