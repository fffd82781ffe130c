//! Dependency Analyzer (spec §4.9): builds an intra-workspace import graph
//! from each file's `ImportInfo` list, detects cycles, and ranks files by
//! import degree.
//!
//! Cycle detection is a hand-rolled DFS with a recursion-stack color map —
//! spec §4.9 fully specifies the algorithm, and the teacher's own
//! `storage/graph.rs` reaches for `petgraph`, which isn't actually declared
//! in the teacher's `Cargo.toml` despite that file importing it (a gap in
//! the retrieval pack). Rather than fabricate a dependency the teacher
//! doesn't carry, this follows the spec's own algorithm directly.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::model::{ClosingImport, Cycle, DegreeRank, DependencyAnalysis, ImportInfo};

const RESOLUTION_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "java", "rs"];

/// Resolve a relative import specifier against the importing file's
/// directory. Non-relative specifiers (package names) resolve to `None` —
/// they name something outside the workspace (spec Non-goals: no
/// cross-language / external edges).
fn resolve_relative(from_file: &Path, spec: &str, known: &HashSet<PathBuf>) -> Option<PathBuf> {
    if !(spec.starts_with("./") || spec.starts_with("../")) {
        return None;
    }
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let joined = normalize(&from_dir.join(spec));

    if known.contains(&joined) {
        return Some(joined);
    }
    for ext in RESOLUTION_EXTENSIONS {
        let with_ext = append_extension(&joined, ext);
        if known.contains(&with_ext) {
            return Some(with_ext);
        }
    }
    for ext in RESOLUTION_EXTENSIONS {
        let index_path = joined.join(format!("index.{ext}"));
        if known.contains(&index_path) {
            return Some(index_path);
        }
    }
    if let Some(stripped) = joined.to_str().and_then(|s| s.strip_suffix(".js")) {
        let ts_sibling = PathBuf::from(format!("{stripped}.ts"));
        if known.contains(&ts_sibling) {
            return Some(ts_sibling);
        }
    }
    None
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Collapse `a/b/../c` into `a/c` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}

struct Edge {
    to: PathBuf,
    line: u32,
}

/// Build the adjacency map for every known file's import list. Multiple
/// imports resolving to the same target keep only the first (lowest line)
/// edge, since a cycle only needs one closing import to report.
fn build_graph(
    files: &[(PathBuf, Vec<ImportInfo>)],
) -> HashMap<PathBuf, Vec<Edge>> {
    let known: HashSet<PathBuf> = files.iter().map(|(p, _)| p.clone()).collect();
    let mut graph: HashMap<PathBuf, Vec<Edge>> = HashMap::new();
    for (path, imports) in files {
        let mut seen_targets = HashSet::new();
        let mut edges = Vec::new();
        for import in imports {
            if let Some(target) = resolve_relative(path, &import.source, &known) {
                if target != *path && seen_targets.insert(target.clone()) {
                    edges.push(Edge {
                        to: target,
                        line: import.line,
                    });
                }
            }
        }
        graph.insert(path.clone(), edges);
    }
    graph
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Color {
    White,
    Gray,
    Black,
}

fn canonical_rotation(cycle: &[PathBuf]) -> Vec<PathBuf> {
    let (min_index, _) = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .expect("cycle is non-empty");
    cycle[min_index..]
        .iter()
        .chain(cycle[..min_index].iter())
        .cloned()
        .collect()
}

fn find_cycles(graph: &HashMap<PathBuf, Vec<Edge>>) -> Vec<Cycle> {
    let mut colors: HashMap<PathBuf, Color> = graph.keys().map(|k| (k.clone(), Color::White)).collect();
    let mut stack: Vec<PathBuf> = Vec::new();
    let mut found: Vec<Cycle> = Vec::new();
    let mut seen_canonical: HashSet<Vec<PathBuf>> = HashSet::new();

    let mut nodes: Vec<PathBuf> = graph.keys().cloned().collect();
    nodes.sort();

    for start in nodes {
        if colors.get(&start) != Some(&Color::White) {
            continue;
        }
        visit(&start, graph, &mut colors, &mut stack, &mut found, &mut seen_canonical);
    }
    found
}

fn visit(
    node: &Path,
    graph: &HashMap<PathBuf, Vec<Edge>>,
    colors: &mut HashMap<PathBuf, Color>,
    stack: &mut Vec<PathBuf>,
    found: &mut Vec<Cycle>,
    seen_canonical: &mut HashSet<Vec<PathBuf>>,
) {
    colors.insert(node.to_path_buf(), Color::Gray);
    stack.push(node.to_path_buf());

    if let Some(edges) = graph.get(node) {
        for edge in edges {
            match colors.get(&edge.to).copied().unwrap_or(Color::White) {
                Color::White => visit(&edge.to, graph, colors, stack, found, seen_canonical),
                Color::Gray => {
                    let start_index = stack.iter().position(|p| p == &edge.to).unwrap_or(0);
                    let cycle_path: Vec<PathBuf> = stack[start_index..].to_vec();
                    let canonical = canonical_rotation(&cycle_path);
                    if seen_canonical.insert(canonical.clone()) {
                        found.push(Cycle {
                            files: canonical,
                            closing_import: ClosingImport {
                                from_file: node.to_path_buf(),
                                to_file: edge.to.clone(),
                                line: edge.line,
                            },
                        });
                    }
                }
                Color::Black => {}
            }
        }
    }

    stack.pop();
    colors.insert(node.to_path_buf(), Color::Black);
}

fn degree_ranking<'a>(
    graph: &'a HashMap<PathBuf, Vec<Edge>>,
    inbound: bool,
) -> Vec<DegreeRank> {
    let mut degrees: HashMap<&'a Path, usize> = HashMap::new();
    for (path, edges) in graph {
        degrees.entry(path.as_path()).or_insert(0);
        if inbound {
            for edge in edges {
                *degrees.entry(edge.to.as_path()).or_insert(0) += 1;
            }
        } else {
            *degrees.entry(path.as_path()).or_insert(0) += edges.len();
        }
    }
    let mut ranked: Vec<DegreeRank> = degrees
        .into_iter()
        .map(|(path, degree)| DegreeRank {
            file_path: path.to_path_buf(),
            degree,
        })
        .collect();
    ranked.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.file_path.cmp(&b.file_path)));
    ranked.truncate(10);
    ranked
}

/// Run the full dependency analysis (spec `analyzeDependencies`).
pub fn analyze(files: &[(PathBuf, Vec<ImportInfo>)]) -> DependencyAnalysis {
    let graph = build_graph(files);
    let total_imports: usize = graph.values().map(|edges| edges.len()).sum();
    let cycles = find_cycles(&graph);
    DependencyAnalysis {
        total_files: files.len(),
        total_imports,
        top_out_degree: degree_ranking(&graph, false),
        top_in_degree: degree_ranking(&graph, true),
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImportType;

    fn import(source: &str, line: u32) -> ImportInfo {
        ImportInfo {
            source: source.to_string(),
            import_type: ImportType::Named,
            bindings: Vec::new(),
            line,
            raw_text: String::new(),
        }
    }

    #[test]
    fn resolves_relative_import_with_appended_extension() {
        let known: HashSet<PathBuf> = ["src/a.ts", "src/b.ts"].iter().map(PathBuf::from).collect();
        let resolved = resolve_relative(Path::new("src/a.ts"), "./b", &known);
        assert_eq!(resolved, Some(PathBuf::from("src/b.ts")));
    }

    #[test]
    fn resolves_directory_index_import() {
        let known: HashSet<PathBuf> = ["src/a.ts", "src/util/index.ts"].iter().map(PathBuf::from).collect();
        let resolved = resolve_relative(Path::new("src/a.ts"), "./util", &known);
        assert_eq!(resolved, Some(PathBuf::from("src/util/index.ts")));
    }

    #[test]
    fn non_relative_specifiers_do_not_resolve() {
        let known: HashSet<PathBuf> = ["src/a.ts"].iter().map(PathBuf::from).collect();
        assert_eq!(resolve_relative(Path::new("src/a.ts"), "react", &known), None);
    }

    #[test]
    fn detects_a_two_file_cycle() {
        let files = vec![
            (PathBuf::from("a.ts"), vec![import("./b", 1)]),
            (PathBuf::from("b.ts"), vec![import("./a", 1)]),
        ];
        let analysis = analyze(&files);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.cycles[0].files.len(), 2);
    }

    #[test]
    fn deduplicates_cycle_found_from_either_entry_point() {
        let files = vec![
            (PathBuf::from("a.ts"), vec![import("./b", 1)]),
            (PathBuf::from("b.ts"), vec![import("./c", 1)]),
            (PathBuf::from("c.ts"), vec![import("./a", 1)]),
        ];
        let analysis = analyze(&files);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.cycles[0].files.len(), 3);
    }

    #[test]
    fn acyclic_graph_reports_no_cycles() {
        let files = vec![
            (PathBuf::from("a.ts"), vec![import("./b", 1)]),
            (PathBuf::from("b.ts"), vec![]),
        ];
        let analysis = analyze(&files);
        assert!(analysis.cycles.is_empty());
        assert_eq!(analysis.top_out_degree[0].file_path, PathBuf::from("a.ts"));
    }
}
