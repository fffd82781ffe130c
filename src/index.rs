//! Project Index (spec §4.7): the stateful heart of the engine. Owns the
//! per-file symbol trees, the flattened symbol table, and the watcher
//! lifecycle, moving through `Uninitialized → Indexing → Ready ↔ Watching
//! → Disposed` (spec §4.7's state machine).
//!
//! Concurrency follows the teacher's storage layer: `DashMap` for the
//! per-file table (spec invariant: a full reindex of one file is a single
//! atomic replace, never observable half-written) and `parking_lot` for the
//! small bits of exclusive state (the lifecycle flag, the watcher handle).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use regex::RegexBuilder;
use tracing::{info, warn};

use crate::analysis::{self, SymbolLocation};
use crate::cache::ParseCache;
use crate::config::Settings;
use crate::deps;
use crate::error::{EngineError, EngineResult};
use crate::fs::Workspace;
use crate::language::{registry_for_settings, LanguageRegistry};
use crate::model::{
    DependencyAnalysis, ExportInfo, FileId, ImportInfo, IndexStats, IndexedSymbol, SymbolKind,
    SymbolTree,
};
use crate::parsing::Parser;
use crate::scanner;
use crate::watcher::{ChangeKind, FileWatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Indexing,
    Ready,
    Watching,
    Disposed,
}

struct FileEntry {
    id: FileId,
    language: &'static str,
    mtime: SystemTime,
    tree: SymbolTree,
    imports: Vec<ImportInfo>,
    exports: Vec<ExportInfo>,
}

/// A symbol search result page, with `truncated` set when `max_results`
/// clipped the match count (spec §4.7 `searchSymbols`).
pub struct SearchResults {
    pub results: Vec<IndexedSymbol>,
    pub truncated: bool,
}

pub struct ProjectIndex {
    workspace: Workspace,
    registry: LanguageRegistry,
    parser: Parser,
    cache: ParseCache,
    state: RwLock<IndexState>,
    files: DashMap<PathBuf, FileEntry>,
    next_file_id: AtomicU32,
    watcher: Mutex<Option<FileWatcher>>,
    debounce: Duration,
}

impl ProjectIndex {
    /// Builds an index over `root` using `Settings::default()`. Most call
    /// sites that need a loaded config should use `with_settings` instead.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_settings(root, &Settings::default())
    }

    /// Builds an index over `root`, wiring the Parse Cache capacity, the
    /// enabled-language filter, the per-file size cap, and the watcher
    /// debounce from `settings` (spec §4.11's config layer).
    pub fn with_settings(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            workspace: Workspace::with_max_file_bytes(root.into(), settings.indexing.max_file_bytes),
            registry: registry_for_settings(settings),
            parser: Parser::with_default_languages(),
            cache: ParseCache::new(settings.cache.max_entries),
            state: RwLock::new(IndexState::Uninitialized),
            files: DashMap::new(),
            next_file_id: AtomicU32::new(1),
            watcher: Mutex::new(None),
            debounce: Duration::from_millis(settings.watcher.debounce_ms),
        }
    }

    pub fn state(&self) -> IndexState {
        *self.state.read()
    }

    pub fn workspace_root(&self) -> &Path {
        self.workspace.root()
    }

    pub fn read_source(&self, path: &Path) -> EngineResult<String> {
        self.workspace.read(path)
    }

    fn require_not_disposed(&self) -> EngineResult<()> {
        if self.state() == IndexState::Disposed {
            return Err(EngineError::NotInitialized {
                operation: "indexProject",
            });
        }
        Ok(())
    }

    fn allocate_file_id(&self) -> FileId {
        let value = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        FileId::new(value).expect("counter never produces zero")
    }

    fn parse_one(&self, path: &Path, language: &'static str) -> EngineResult<(SymbolTree, Vec<ImportInfo>, Vec<ExportInfo>, SystemTime)> {
        let stat = self.workspace.stats(path)?;
        if let Some(tree) = self.cache.get(path, stat.mtime) {
            let language_id = crate::language::LanguageId(language);
            let source = self.workspace.read(path)?;
            let imports = self.parser.extract_imports(language_id, &source, path);
            let exports = self.parser.extract_exports(language_id, &source, path);
            return Ok((tree, imports, exports, stat.mtime));
        }
        let source = self.workspace.read(path)?;
        let language_id = crate::language::LanguageId(language);
        let tree = self
            .parser
            .parse(language_id, &source, path)
            .ok_or_else(|| EngineError::UnknownLanguage {
                path: path.to_path_buf(),
            })?;
        let imports = self.parser.extract_imports(language_id, &source, path);
        let exports = self.parser.extract_exports(language_id, &source, path);
        self.cache.set(path, stat.mtime, tree.clone());
        Ok((tree, imports, exports, stat.mtime))
    }

    /// Full cold-cache index of the workspace: scans for recognized files,
    /// parses each one — in parallel, via rayon — then writes results into
    /// the (already-concurrent) file table.
    pub fn index_project(&self) -> EngineResult<IndexStats> {
        self.require_not_disposed()?;
        *self.state.write() = IndexState::Indexing;

        let scanned = scanner::scan(self.workspace.root(), &self.registry);
        let parsed: Vec<_> = scanned
            .par_iter()
            .map(|file| (file, self.parse_one(&file.path, file.language)))
            .collect();

        let mut parse_errors = 0usize;
        let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
        for (file, result) in parsed {
            match result {
                Ok((tree, imports, exports, mtime)) => {
                    parse_errors += tree.errors.len();
                    *histogram.entry(file.language.to_string()).or_insert(0) += 1;
                    let id = self.allocate_file_id();
                    self.files.insert(
                        file.path.clone(),
                        FileEntry {
                            id,
                            language: file.language,
                            mtime,
                            tree,
                            imports,
                            exports,
                        },
                    );
                }
                Err(err) => {
                    warn!(path = %file.path.display(), error = %err, "skipping file that failed to parse");
                }
            }
        }

        *self.state.write() = IndexState::Ready;
        info!(files = self.files.len(), "index build complete");
        Ok(self.stats(parse_errors, histogram))
    }

    fn stats(&self, parse_errors: usize, histogram: BTreeMap<String, usize>) -> IndexStats {
        let symbols_indexed: usize = self
            .files
            .iter()
            .map(|entry| count_symbols(&entry.tree.symbols))
            .sum();
        IndexStats {
            files_indexed: self.files.len(),
            symbols_indexed,
            parse_errors,
            language_histogram: histogram,
            last_indexed_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_millis() as u64,
        }
    }

    /// Reparses a single file and atomically replaces its entry. Reindex
    /// failures are logged, never propagated — a transient I/O error on one
    /// file must not take down the whole watch session (spec §4.7).
    pub fn reindex_file(&self, path: &Path) {
        let Some(descriptor) = self.registry.get_by_path(path) else {
            return;
        };
        match self.parse_one(path, descriptor.id.as_str()) {
            Ok((tree, imports, exports, mtime)) => {
                let id = self
                    .files
                    .get(path)
                    .map(|e| e.id)
                    .unwrap_or_else(|| self.allocate_file_id());
                self.files.insert(
                    path.to_path_buf(),
                    FileEntry {
                        id,
                        language: descriptor.id.as_str(),
                        mtime,
                        tree,
                        imports,
                        exports,
                    },
                );
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "reindex failed, keeping prior entry");
            }
        }
    }

    pub fn remove_file(&self, path: &Path) {
        self.files.remove(path);
        self.cache.invalidate(path);
    }

    pub fn search_symbols(&self, pattern: &str, kinds: Option<&[SymbolKind]>, max_results: usize) -> EngineResult<SearchResults> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|reason| EngineError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: reason.to_string(),
            })?;

        let mut matches = Vec::new();
        for entry in self.files.iter() {
            let path = entry.key().clone();
            collect_matching(&entry.tree.symbols, "", &path, &re, kinds, &mut matches);
        }
        matches.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        let truncated = matches.len() > max_results;
        matches.truncate(max_results);
        Ok(SearchResults {
            results: matches,
            truncated,
        })
    }

    pub fn get_file_symbols(&self, path: &Path) -> Option<SymbolTree> {
        self.files.get(path).map(|e| e.tree.clone())
    }

    pub fn get_tree(&self, path: &Path) -> Option<SymbolTree> {
        self.get_file_symbols(path)
    }

    pub fn get_file_imports(&self, path: &Path) -> Vec<ImportInfo> {
        self.files.get(path).map(|e| e.imports.clone()).unwrap_or_default()
    }

    pub fn get_indexed_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.files.iter().map(|e| e.key().clone()).collect();
        files.sort();
        files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get_stats(&self) -> IndexStats {
        self.stats(
            self.files.iter().map(|e| e.tree.errors.len()).sum(),
            {
                let mut histogram = BTreeMap::new();
                for entry in self.files.iter() {
                    *histogram.entry(entry.language.to_string()).or_insert(0) += 1;
                }
                histogram
            },
        )
    }

    pub fn analyze_dependencies(&self) -> DependencyAnalysis {
        let files: Vec<(PathBuf, Vec<ImportInfo>)> = self
            .files
            .iter()
            .map(|e| (e.key().clone(), e.imports.clone()))
            .collect();
        deps::analyze(&files)
    }

    fn sources(&self) -> Vec<(PathBuf, String)> {
        self.files
            .iter()
            .filter_map(|e| {
                self.workspace
                    .read(e.key())
                    .ok()
                    .map(|source| (e.key().clone(), source))
            })
            .collect()
    }

    pub fn find_references(&self, symbol_name: &str) -> Vec<crate::model::SymbolReference> {
        analysis::find_references(symbol_name, &self.sources())
    }

    pub fn get_callers(&self, symbol_name: &str) -> Vec<crate::model::CallSite> {
        let sources = self.sources();
        let mut locations = Vec::new();
        for entry in self.files.iter() {
            collect_locations(&entry.tree.symbols, "", entry.key(), &mut locations);
        }
        let symbol_locations: Vec<SymbolLocation> = locations
            .iter()
            .map(|(path, qualified_name, declaration_line, body_span)| SymbolLocation {
                file_path: path,
                qualified_name,
                declaration_line: *declaration_line,
                body_span: *body_span,
            })
            .collect();
        analysis::get_callers(symbol_name, &sources, &symbol_locations)
    }

    pub fn get_callees(&self, file_path: &Path, qualified_name: &str) -> Vec<crate::model::CallSite> {
        let Some(entry) = self.files.get(file_path) else {
            return Vec::new();
        };
        let mut locations = Vec::new();
        collect_locations(&entry.tree.symbols, "", file_path, &mut locations);
        let Some((_, _, declaration_line, Some(body_span))) =
            locations.into_iter().find(|(_, name, _, _)| name == qualified_name)
        else {
            return Vec::new();
        };
        let Ok(source) = self.workspace.read(file_path) else {
            return Vec::new();
        };
        analysis::get_callees(file_path, qualified_name, &source, declaration_line, body_span)
    }

    /// Begins watching the workspace root, delegating debounced change
    /// events to `reindex_file`/`remove_file`. Requires `Arc<Self>` so the
    /// background drain thread can outlive this call.
    pub fn start_watching(self: &Arc<Self>) -> EngineResult<()> {
        if self.state() != IndexState::Ready {
            return Err(EngineError::NotInitialized {
                operation: "startWatching",
            });
        }
        let watcher = FileWatcher::start(self.workspace.root(), self.debounce)
            .map_err(|source| EngineError::Io {
                path: self.workspace.root().to_path_buf(),
                source: std::io::Error::other(source),
            })?;
        let receiver = watcher.receiver().clone();
        *self.watcher.lock() = Some(watcher);
        *self.state.write() = IndexState::Watching;

        let index = Arc::clone(self);
        std::thread::spawn(move || {
            while let Ok(change) = receiver.recv() {
                if index.state() != IndexState::Watching {
                    break;
                }
                let path = index.workspace.relativize(&change.path);
                match change.kind {
                    ChangeKind::Created | ChangeKind::Modified => index.reindex_file(&path),
                    ChangeKind::Deleted => index.remove_file(&path),
                }
            }
        });
        Ok(())
    }

    pub fn stop_watching(&self) {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
        if self.state() == IndexState::Watching {
            *self.state.write() = IndexState::Ready;
        }
    }

    pub fn dispose(&self) {
        self.stop_watching();
        self.files.clear();
        *self.state.write() = IndexState::Disposed;
    }
}

fn count_symbols(symbols: &[crate::model::Symbol]) -> usize {
    symbols
        .iter()
        .filter(|s| s.kind != SymbolKind::Import)
        .map(|s| 1 + count_symbols(&s.children))
        .sum()
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}::{name}")
    }
}

fn collect_matching(
    symbols: &[crate::model::Symbol],
    prefix: &str,
    path: &Path,
    re: &regex::Regex,
    kinds: Option<&[SymbolKind]>,
    out: &mut Vec<IndexedSymbol>,
) {
    for symbol in symbols {
        if symbol.kind == SymbolKind::Import {
            continue;
        }
        let qualified_name = qualify(prefix, &symbol.name);
        let kind_matches = kinds.map(|ks| ks.contains(&symbol.kind)).unwrap_or(true);
        if kind_matches && re.is_match(&symbol.name) {
            out.push(IndexedSymbol {
                name: symbol.name.clone(),
                qualified_name: qualified_name.clone(),
                kind: symbol.kind,
                file_path: path.to_path_buf(),
                start_line: symbol.declaration_span.start.line,
                end_line: symbol.declaration_span.end.line,
            });
        }
        if !symbol.children.is_empty() {
            collect_matching(&symbol.children, &qualified_name, path, re, kinds, out);
        }
    }
}

#[allow(clippy::type_complexity)]
fn collect_locations(
    symbols: &[crate::model::Symbol],
    prefix: &str,
    path: &Path,
    out: &mut Vec<(PathBuf, String, u32, Option<crate::model::Span>)>,
) {
    for symbol in symbols {
        if symbol.kind == SymbolKind::Import {
            continue;
        }
        let qualified_name = qualify(prefix, &symbol.name);
        out.push((
            path.to_path_buf(),
            qualified_name.clone(),
            symbol.declaration_span.start.line,
            symbol.body_span,
        ));
        if !symbol.children.is_empty() {
            collect_locations(&symbol.children, &qualified_name, path, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        fs::write(dir.join(rel), content).unwrap();
    }

    #[test]
    fn index_project_transitions_to_ready_and_counts_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn greet() {}\n");
        write(dir.path(), "b.py", "def hello():\n    pass\n");

        let index = ProjectIndex::new(dir.path());
        assert_eq!(index.state(), IndexState::Uninitialized);
        let stats = index.index_project().unwrap();
        assert_eq!(index.state(), IndexState::Ready);
        assert_eq!(stats.files_indexed, 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn search_symbols_matches_case_insensitively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn GreetUser() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        let results = index.search_symbols("greetuser", None, 10).unwrap();
        assert_eq!(results.results.len(), 1);
        assert!(!results.truncated);
    }

    #[test]
    fn reindex_file_replaces_the_entry_atomically() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn one() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();

        write(dir.path(), "a.rs", "fn two() {}\n");
        index.reindex_file(Path::new("a.rs"));
        let tree = index.get_file_symbols(Path::new("a.rs")).unwrap();
        let names: Vec<_> = tree.visible_symbols().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["two"]);
    }

    #[test]
    fn remove_file_drops_it_from_the_index() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn one() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();
        index.remove_file(Path::new("a.rs"));
        assert!(index.is_empty());
    }

    #[test]
    fn dispose_clears_state() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "fn one() {}\n");
        let index = ProjectIndex::new(dir.path());
        index.index_project().unwrap();
        index.dispose();
        assert_eq!(index.state(), IndexState::Disposed);
        assert!(index.is_empty());
    }
}
