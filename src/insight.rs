//! Insight Synthesizer (spec §4.10): the one component that composes
//! output from every other component — symbol lookup, call search,
//! dependency edges, and the `git` "recent changes" collaborator — behind
//! a single `target` string that can name a file, a directory, or a
//! symbol.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::git::{self, CommitSummary};
use crate::index::ProjectIndex;
use crate::model::{CallSite, ImportInfo, IndexedSymbol, SymbolKind};

/// Controls how much an insight composes. Defaults match spec §4.10:
/// call graphs and source excerpts are included, and up to 10 recent
/// commits are attached.
#[derive(Debug, Clone, Copy)]
pub struct InsightOptions {
    pub include_call_graph: bool,
    pub include_code: bool,
    pub max_changes: usize,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            include_call_graph: true,
            include_code: true,
            max_changes: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileInsight {
    pub path: PathBuf,
    pub language: String,
    pub top_level_symbols: Vec<IndexedSymbol>,
    pub imports: Vec<ImportInfo>,
    pub recent_changes: Vec<CommitSummary>,
    pub source_excerpt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryInsight {
    pub path: PathBuf,
    pub file_count: usize,
    pub language_histogram: BTreeMap<String, usize>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SymbolInsight {
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    pub callers: Vec<CallSite>,
    pub callees: Vec<CallSite>,
    pub source_excerpt: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Insight {
    File(FileInsight),
    Directory(DirectoryInsight),
    Symbol(SymbolInsight),
}

enum Target {
    File(PathBuf),
    Directory(PathBuf),
    Symbol(IndexedSymbol),
}

/// Classifies `target` per spec §4.10: an absolute or workspace-relative
/// path that resolves to a file or directory wins over symbol-name
/// interpretation; otherwise the string is looked up as a symbol name,
/// exact match first, then substring. Multiple candidates at any stage is
/// an `AmbiguousTarget` error — this never silently picks one.
fn classify(index: &ProjectIndex, target: &str) -> EngineResult<Target> {
    let candidate_path = Path::new(target);
    let resolved = if candidate_path.is_absolute() {
        candidate_path.to_path_buf()
    } else {
        index.workspace_root().join(candidate_path)
    };

    if resolved.is_file() {
        let relative = pathdiff(&resolved, index.workspace_root());
        return Ok(Target::File(relative));
    }
    if resolved.is_dir() {
        let relative = pathdiff(&resolved, index.workspace_root());
        return Ok(Target::Directory(relative));
    }

    let exact_pattern = format!("^{}$", regex::escape(target));
    let exact = index.search_symbols(&exact_pattern, None, usize::MAX)?;
    if exact.results.len() == 1 {
        return Ok(Target::Symbol(exact.results.into_iter().next().unwrap()));
    }
    if exact.results.len() > 1 {
        return Err(ambiguous(target, &exact.results));
    }

    let substring_pattern = regex::escape(target);
    let substring = index.search_symbols(&substring_pattern, None, usize::MAX)?;
    match substring.results.len() {
        0 => Err(EngineError::SymbolNotFound {
            name: target.to_string(),
        }),
        1 => Ok(Target::Symbol(substring.results.into_iter().next().unwrap())),
        _ => Err(ambiguous(target, &substring.results)),
    }
}

fn ambiguous(target: &str, candidates: &[IndexedSymbol]) -> EngineError {
    EngineError::AmbiguousTarget {
        target: target.to_string(),
        candidates: candidates
            .iter()
            .map(|s| format!("{} ({})", s.qualified_name, s.file_path.display()))
            .collect(),
    }
}

fn pathdiff(absolute: &Path, root: &Path) -> PathBuf {
    absolute.strip_prefix(root).unwrap_or(absolute).to_path_buf()
}

fn excerpt(source: &str, start_line: u32, end_line: u32) -> String {
    source
        .lines()
        .skip(start_line.saturating_sub(1) as usize)
        .take((end_line.saturating_sub(start_line) + 1) as usize)
        .collect::<Vec<_>>()
        .join("\n")
}

fn file_insight(index: &ProjectIndex, path: &Path, options: &InsightOptions) -> EngineResult<FileInsight> {
    let tree = index
        .get_file_symbols(path)
        .ok_or_else(|| EngineError::FileNotFound {
            path: path.to_path_buf(),
        })?;

    let search = index.search_symbols(".*", None, usize::MAX)?;
    let top_level_symbols: Vec<IndexedSymbol> = search
        .results
        .into_iter()
        .filter(|s| s.file_path == path && !s.qualified_name.contains("::"))
        .collect();

    let source_excerpt = if options.include_code {
        index.read_source(path).ok()
    } else {
        None
    };
    let imports = index.get_file_imports(path);
    let recent_changes = git::recent_changes(index.workspace_root(), path, options.max_changes);

    Ok(FileInsight {
        path: path.to_path_buf(),
        language: tree.language,
        top_level_symbols,
        imports,
        recent_changes,
        source_excerpt,
    })
}

fn directory_insight(index: &ProjectIndex, dir: &Path) -> DirectoryInsight {
    let mut files = Vec::new();
    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
    for file in index.get_indexed_files() {
        if file.starts_with(dir) {
            if let Some(tree) = index.get_file_symbols(&file) {
                *histogram.entry(tree.language).or_insert(0) += 1;
            }
            files.push(file);
        }
    }
    DirectoryInsight {
        path: dir.to_path_buf(),
        file_count: files.len(),
        language_histogram: histogram,
        files,
    }
}

/// Insight composition caps callers/callees at 10 each, and deduplicates
/// callers by `(fromSymbol, filePath)` (spec §4.10) — the raw index queries
/// return every match, unbounded.
const MAX_CALL_GRAPH_ENTRIES: usize = 10;

fn dedup_callers(mut callers: Vec<CallSite>) -> Vec<CallSite> {
    let mut seen = std::collections::HashSet::new();
    callers.retain(|c| seen.insert((c.caller_qualified_name.clone(), c.file_path.clone())));
    callers.truncate(MAX_CALL_GRAPH_ENTRIES);
    callers
}

fn symbol_insight(index: &ProjectIndex, symbol: &IndexedSymbol, options: &InsightOptions) -> SymbolInsight {
    let (callers, mut callees) = if options.include_call_graph {
        (
            dedup_callers(index.get_callers(&symbol.name)),
            index.get_callees(&symbol.file_path, &symbol.qualified_name),
        )
    } else {
        (Vec::new(), Vec::new())
    };
    callees.truncate(MAX_CALL_GRAPH_ENTRIES);

    let source_excerpt = if options.include_code {
        index
            .read_source(&symbol.file_path)
            .ok()
            .map(|source| excerpt(&source, symbol.start_line, symbol.end_line))
    } else {
        None
    };

    SymbolInsight {
        qualified_name: symbol.qualified_name.clone(),
        kind: symbol.kind,
        file_path: symbol.file_path.clone(),
        callers,
        callees,
        source_excerpt,
    }
}

/// `synthesizeInsight(target, options)` (spec §4.10).
pub fn synthesize(index: &ProjectIndex, target: &str, options: &InsightOptions) -> EngineResult<Insight> {
    match classify(index, target)? {
        Target::File(path) => Ok(Insight::File(file_insight(index, &path, options)?)),
        Target::Directory(path) => Ok(Insight::Directory(directory_insight(index, &path))),
        Target::Symbol(symbol) => Ok(Insight::Symbol(symbol_insight(index, &symbol, options))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        if let Some(parent) = Path::new(rel).parent() {
            fs::create_dir_all(dir.join(parent)).unwrap();
        }
        fs::write(dir.join(rel), content).unwrap();
    }

    #[test]
    fn classifies_an_existing_file_as_a_file_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.rs", "fn greet() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let insight = synthesize(&index, "src/a.rs", &InsightOptions::default()).unwrap();
        assert!(matches!(insight, Insight::File(_)));
    }

    #[test]
    fn classifies_a_directory_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.rs", "fn greet() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let insight = synthesize(&index, "src", &InsightOptions::default()).unwrap();
        match insight {
            Insight::Directory(d) => assert_eq!(d.file_count, 1),
            _ => panic!("expected directory insight"),
        }
    }

    #[test]
    fn unique_symbol_name_resolves_to_a_symbol_insight() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn uniquely_named_helper() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let insight = synthesize(&index, "uniquely_named_helper", &InsightOptions::default()).unwrap();
        match insight {
            Insight::Symbol(s) => assert_eq!(s.qualified_name, "uniquely_named_helper"),
            _ => panic!("expected symbol insight"),
        }
    }

    #[test]
    fn ambiguous_symbol_name_is_an_error_not_a_guess() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn run() {}\n");
        write(dir.path(), "b.rs", "fn run() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let err = synthesize(&index, "run", &InsightOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AmbiguousTarget);
    }

    #[test]
    fn unknown_target_is_symbol_not_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn run() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let err = synthesize(&index, "does_not_exist_anywhere", &InsightOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }
}
