//! Dependency graph construction.
//!
//! Nodes are analyzed files. Import entries are resolved to other analyzed
//! files; references that resolve nowhere (external packages, system headers)
//! produce no edge.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::models::{DependencyGraph, EdgeRelation, GraphCluster, GraphEdge, GraphNode};
use crate::analyzer::{FileAnalysis, ImportKind, Language};

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Build the graph for a set of analyses. Output order is deterministic.
#[must_use]
pub fn build_graph(files: &[Arc<FileAnalysis>], max_cycles: usize) -> DependencyGraph {
    let known: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
    let resolver = Resolver { known: &known };

    let mut weights: BTreeMap<(String, String, EdgeRelation), u32> = BTreeMap::new();
    for file in files {
        let source = node_id(&file.path);
        let references = file
            .imports
            .iter()
            .map(|i| (i.module.as_str(), relation_of(i.kind)))
            .chain(
                file.exports
                    .iter()
                    .filter_map(|e| e.source.as_deref().map(|s| (s, EdgeRelation::Export))),
            );
        for (module, relation) in references {
            let Some(target) = resolver.resolve(file, module) else {
                continue;
            };
            *weights
                .entry((source.clone(), node_id(&target), relation))
                .or_insert(0) += 1;
        }
    }

    let edges: Vec<GraphEdge> = weights
        .into_iter()
        .map(|((source, target, relation), weight)| GraphEdge {
            source,
            target,
            relation,
            weight,
        })
        .collect();

    let mut degree: HashMap<&str, usize> = HashMap::new();
    // A self import is a cycle but does not connect a file to anything.
    for edge in edges.iter().filter(|e| e.source != e.target) {
        *degree.entry(edge.source.as_str()).or_insert(0) += 1;
        *degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let denominator = files.len().saturating_sub(1).max(1) as f64;
    let mut nodes: Vec<GraphNode> = files
        .iter()
        .map(|file| {
            let id = node_id(&file.path);
            #[allow(clippy::cast_precision_loss)]
            let centrality = degree.get(id.as_str()).copied().unwrap_or(0) as f64 / denominator;
            GraphNode {
                label: file
                    .path
                    .file_name()
                    .map_or_else(|| id.clone(), |n| n.to_string_lossy().into_owned()),
                id,
                language: file.language,
                size: file.size,
                complexity: file.complexity,
                centrality,
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let cycles = find_cycles(&edges, max_cycles);

    DependencyGraph {
        clusters: clusters_of(&nodes),
        nodes,
        edges,
        cycles,
    }
}

fn node_id(path: &Path) -> String {
    path.display().to_string()
}

const fn relation_of(kind: ImportKind) -> EdgeRelation {
    match kind {
        ImportKind::Import => EdgeRelation::Import,
        ImportKind::DynamicImport => EdgeRelation::DynamicImport,
        ImportKind::Require => EdgeRelation::Require,
    }
}

/// Group nodes by parent directory.
fn clusters_of(nodes: &[GraphNode]) -> Vec<GraphCluster> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in nodes {
        let dir = Path::new(&node.id)
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        groups.entry(dir).or_default().push(node.id.clone());
    }

    groups
        .into_iter()
        .map(|(id, nodes)| GraphCluster {
            label: Path::new(&id)
                .file_name()
                .map_or_else(|| id.clone(), |n| n.to_string_lossy().into_owned()),
            id,
            nodes,
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Iterative depth-first search over import-like edges.
///
/// Each back edge yields one cycle, rotated to start at its smallest node
/// so the same cycle found from different entry points is reported once.
pub fn find_cycles(edges: &[GraphEdge], max_cycles: usize) -> Vec<Vec<String>> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.relation.is_import()) {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .insert(edge.target.as_str());
        adjacency.entry(edge.target.as_str()).or_default();
    }
    let adjacency: BTreeMap<&str, Vec<&str>> = adjacency
        .into_iter()
        .map(|(node, targets)| (node, targets.into_iter().collect()))
        .collect();

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut found: BTreeSet<Vec<String>> = BTreeSet::new();

    for &start in adjacency.keys() {
        if marks.contains_key(start) {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        let mut position: HashMap<&str, usize> = HashMap::from([(start, 0)]);
        marks.insert(start, Mark::Active);

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let children = adjacency.get(node).map_or(&[][..], Vec::as_slice);
            if *next < children.len() {
                let child = children[*next];
                *next += 1;
                match marks.get(child) {
                    Some(Mark::Active) if found.len() < max_cycles => {
                        if let Some(&from) = position.get(child) {
                            let cycle: Vec<&str> = stack[from..].iter().map(|(n, _)| *n).collect();
                            found.insert(canonical(&cycle));
                        }
                    }
                    Some(_) => {}
                    None => {
                        marks.insert(child, Mark::Active);
                        position.insert(child, stack.len());
                        stack.push((child, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                position.remove(node);
                stack.pop();
            }
        }
    }

    found.into_iter().collect()
}

fn canonical(cycle: &[&str]) -> Vec<String> {
    let min = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| **n)
        .map_or(0, |(i, _)| i);
    cycle[min..]
        .iter()
        .chain(&cycle[..min])
        .map(|n| (*n).to_string())
        .collect()
}

/// Maps module references to analyzed files.
struct Resolver<'a> {
    known: &'a HashSet<&'a Path>,
}

impl Resolver<'_> {
    fn resolve(&self, file: &FileAnalysis, module: &str) -> Option<PathBuf> {
        let dir = file.path.parent()?;
        let target = match file.language {
            Language::TypeScript | Language::JavaScript => self.resolve_script(dir, module),
            Language::Python => self.resolve_python(dir, module),
            Language::Rust => self.resolve_rust(&file.path, module),
            Language::C | Language::Cpp => self.resolve_include(dir, module),
            _ => None,
        }?;

        // `use self::Item` and `from . import name` refer to the file's own
        // package, not to a self import.
        let own_scope = file.language == Language::Rust
            || (file.language == Language::Python && module.chars().all(|c| c == '.'));
        if own_scope && target == file.path {
            return None;
        }
        Some(target)
    }

    fn first_known(&self, candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
        candidates
            .into_iter()
            .find(|c| self.known.contains(c.as_path()))
    }

    /// Relative specifiers with extension and `index` file fallbacks.
    fn resolve_script(&self, dir: &Path, module: &str) -> Option<PathBuf> {
        if !(module.starts_with("./") || module.starts_with("../")) {
            return None;
        }
        let base = normalize(&dir.join(module));
        let mut candidates = vec![base.clone()];
        for ext in SCRIPT_EXTENSIONS {
            candidates.push(append_extension(&base, ext));
        }
        for ext in SCRIPT_EXTENSIONS {
            candidates.push(base.join(format!("index.{ext}")));
        }
        self.first_known(candidates)
    }

    /// Relative (`.models`, `..util`) and absolute dotted modules.
    fn resolve_python(&self, dir: &Path, module: &str) -> Option<PathBuf> {
        let dots = module.chars().take_while(|c| *c == '.').count();
        let rest: PathBuf = module[dots..].split('.').filter(|s| !s.is_empty()).collect();

        if dots > 0 {
            let mut base = dir.to_path_buf();
            for _ in 1..dots {
                base = base.parent()?.to_path_buf();
            }
            let base = base.join(&rest);
            return self.first_known([append_extension(&base, "py"), base.join("__init__.py")]);
        }

        // Absolute modules resolve against the importing file's ancestors.
        dir.ancestors().find_map(|ancestor| {
            let base = ancestor.join(&rest);
            self.first_known([append_extension(&base, "py"), base.join("__init__.py")])
        })
    }

    /// `mod x`, `self::x`, `super::x` and `crate::x` paths.
    fn resolve_rust(&self, file: &Path, module: &str) -> Option<PathBuf> {
        let dir = file.parent()?;
        let stem = file.file_stem()?.to_string_lossy();
        // Children of `foo.rs` live in `foo/`; of `mod.rs`, `lib.rs` and `main.rs` alongside.
        let module_dir = if matches!(stem.as_ref(), "mod" | "lib" | "main") {
            dir.to_path_buf()
        } else {
            dir.join(stem.as_ref())
        };

        let mut segments: Vec<&str> = module.split("::").collect();
        let mut base = match segments.first().copied() {
            Some("crate") => {
                segments.remove(0);
                dir.ancestors()
                    .find(|a| a.file_name().is_some_and(|n| n == "src"))?
                    .to_path_buf()
            }
            Some("super") => {
                let mut base = module_dir.clone();
                while segments.first() == Some(&"super") {
                    segments.remove(0);
                    base = base.parent()?.to_path_buf();
                }
                base
            }
            Some("self") => {
                segments.remove(0);
                module_dir
            }
            Some(_) if segments.len() == 1 => module_dir,
            _ => return None,
        };

        // Try the longest module path first; trailing segments may name items.
        while !segments.is_empty() {
            let candidate: PathBuf = segments.iter().collect();
            let full = base.join(&candidate);
            if let Some(found) = self.first_known([append_extension(&full, "rs"), full.join("mod.rs")]) {
                return Some(found);
            }
            segments.pop();
        }
        base = normalize(&base);
        self.first_known([base.join("mod.rs"), base.with_extension("rs")])
    }

    /// Quoted includes relative to the including file, then by suffix.
    fn resolve_include(&self, dir: &Path, module: &str) -> Option<PathBuf> {
        let relative = normalize(&dir.join(module));
        if self.known.contains(relative.as_path()) {
            return Some(relative);
        }
        let suffix = Path::new(module);
        let mut matches: Vec<&Path> = self
            .known
            .iter()
            .copied()
            .filter(|p| p.ends_with(suffix))
            .collect();
        matches.sort();
        matches.first().map(|p| p.to_path_buf())
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FileAnalyzer;

    fn analyze(files: &[(&str, &str)]) -> Vec<Arc<FileAnalysis>> {
        let analyzer = FileAnalyzer::new();
        files
            .iter()
            .map(|(path, content)| Arc::new(analyzer.analyze_file(Path::new(path), content.as_bytes())))
            .collect()
    }

    fn edge_pairs(graph: &DependencyGraph) -> Vec<(&str, &str, EdgeRelation, u32)> {
        graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.relation, e.weight))
            .collect()
    }

    #[test]
    fn test_script_resolution_and_weights() {
        let files = analyze(&[
            (
                "/repo/src/app.ts",
                "import { a } from './util';\nimport { b } from './util';\nimport React from 'react';\nconst w = require('./widgets');\n",
            ),
            ("/repo/src/util.ts", "export const a = 1;\nexport const b = 2;\n"),
            ("/repo/src/widgets/index.js", "module.exports = {};\n"),
        ]);
        let graph = build_graph(&files, 10);
        assert_eq!(
            edge_pairs(&graph),
            vec![
                ("/repo/src/app.ts", "/repo/src/util.ts", EdgeRelation::Import, 2),
                ("/repo/src/app.ts", "/repo/src/widgets/index.js", EdgeRelation::Require, 1),
            ]
        );
        assert_eq!(graph.nodes.len(), 3);
        let app = graph.nodes.iter().find(|n| n.label == "app.ts").unwrap();
        assert!((app.centrality - 1.0).abs() < f64::EPSILON);
        assert!(graph.cycles.is_empty());
    }

    #[test]
    fn test_cycle_detection() {
        let files = analyze(&[
            ("/repo/a.ts", "import { b } from './b';\n"),
            ("/repo/b.ts", "import { c } from './c';\n"),
            ("/repo/c.ts", "import { a } from './a';\n"),
            ("/repo/d.ts", "import { a } from './a';\n"),
        ]);
        let graph = build_graph(&files, 10);
        assert_eq!(
            graph.cycles,
            vec![vec![
                "/repo/a.ts".to_string(),
                "/repo/b.ts".to_string(),
                "/repo/c.ts".to_string()
            ]]
        );
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let files = analyze(&[
            ("/repo/a.ts", "import { a } from './a';\n"),
            ("/repo/b.ts", "import { a } from './a';\n"),
        ]);
        let graph = build_graph(&files, 10);

        assert_eq!(graph.cycles, vec![vec!["/repo/a.ts".to_string()]]);
        assert!(edge_pairs(&graph).contains(&("/repo/a.ts", "/repo/a.ts", EdgeRelation::Import, 1)));
        let a = graph.nodes.iter().find(|n| n.id == "/repo/a.ts").unwrap();
        assert!((a.centrality - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_own_scope_references_are_not_self_imports() {
        let files = analyze(&[
            ("/repo/src/kind.rs", "use self::Kind::*;\npub enum Kind { A }\n"),
            ("/repo/pkg/__init__.py", "from . import views\n"),
            ("/repo/pkg/views.py", "def index():\n    pass\n"),
        ]);
        let graph = build_graph(&files, 10);

        assert!(graph.cycles.is_empty());
        assert!(graph.edges.iter().all(|e| e.source != e.target));
    }

    #[test]
    fn test_python_and_rust_resolution() {
        let files = analyze(&[
            ("/repo/pkg/views.py", "from .models import User\nimport pkg.util\n"),
            ("/repo/pkg/models.py", "class User:\n    pass\n"),
            ("/repo/pkg/util.py", "def f():\n    pass\n"),
            ("/repo/src/lib.rs", "mod search;\nuse crate::search::SearchIndex;\n"),
            ("/repo/src/search/mod.rs", "pub struct SearchIndex;\n"),
        ]);
        let graph = build_graph(&files, 10);
        let pairs = edge_pairs(&graph);
        assert!(pairs.contains(&("/repo/pkg/views.py", "/repo/pkg/models.py", EdgeRelation::Import, 1)));
        assert!(pairs.contains(&("/repo/pkg/views.py", "/repo/pkg/util.py", EdgeRelation::Import, 1)));
        assert!(pairs.contains(&("/repo/src/lib.rs", "/repo/src/search/mod.rs", EdgeRelation::Import, 2)));
    }

    #[test]
    fn test_clusters_by_directory() {
        let files = analyze(&[
            ("/repo/src/a.ts", ""),
            ("/repo/src/b.ts", ""),
            ("/repo/test/c.ts", ""),
        ]);
        let graph = build_graph(&files, 10);
        let clusters: Vec<_> = graph
            .clusters
            .iter()
            .map(|c| (c.label.as_str(), c.nodes.len()))
            .collect();
        assert_eq!(clusters, vec![("src", 2), ("test", 1)]);
    }

    #[test]
    fn test_export_edges_do_not_form_cycles() {
        let edges = vec![
            GraphEdge {
                source: "a".into(),
                target: "b".into(),
                relation: EdgeRelation::Import,
                weight: 1,
            },
            GraphEdge {
                source: "b".into(),
                target: "a".into(),
                relation: EdgeRelation::Export,
                weight: 1,
            },
        ];
        assert!(find_cycles(&edges, 10).is_empty());
    }
}
