//! Project Scanner (spec §4.5): walks a workspace root, yielding files in
//! registered languages while excluding a fixed denylist of directories.
//!
//! Grounded in the teacher's `indexing/walker.rs` use of
//! `ignore::WalkBuilder`, but spec §4.5 wants a *fixed* denylist rather
//! than `.gitignore` semantics, so `.git_ignore(false)` /
//! `.ignore(false)` disable the crate's built-in VCS-aware filtering and
//! `filter_entry` enforces the spec's own list instead.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::language::LanguageRegistry;

/// Directory names the scanner never descends into, regardless of
/// `.gitignore` content (spec §4.5).
pub const DENYLIST: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
];

fn is_denied(entry_name: &str) -> bool {
    DENYLIST.contains(&entry_name) || (entry_name.starts_with('.') && entry_name != ".")
}

/// One recognized source file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub language: &'static str,
}

/// Walks `root` depth-first, name-sorted, yielding every file whose
/// extension is registered in `registry`. Never follows symlinks that
/// escape the root. Paths are always workspace-relative (spec §4.5), since
/// the rest of the engine keys everything — the file table, the cache, the
/// watcher — by the same relative path.
pub fn scan(root: &Path, registry: &LanguageRegistry) -> Vec<ScannedFile> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !is_denied(name) || entry.depth() == 0)
                .unwrap_or(true)
        })
        .build();

    for result in walker {
        let Ok(entry) = result else { continue };
        if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            if let Some(descriptor) = registry.get_by_path(entry.path()) {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                files.push(ScannedFile {
                    path: relative.to_path_buf(),
                    language: descriptor.id.as_str(),
                });
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::default_registry;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_registered_language_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "README.md", "hello");
        let registry = default_registry();

        let files = scan(dir.path(), &registry);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, "rust");
    }

    #[test]
    fn skips_denylisted_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/pkg/index.js", "module.exports = {};");
        write(dir.path(), "src/index.js", "export const x = 1;");
        let registry = default_registry();

        let files = scan(dir.path(), &registry);
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("src/index.js"));
    }

    #[test]
    fn skips_dot_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".git/config", "");
        write(dir.path(), ".hidden/a.py", "x = 1");
        write(dir.path(), "a.py", "x = 1");
        let registry = default_registry();

        let files = scan(dir.path(), &registry);
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("a.py"));
    }

    #[test]
    fn results_are_name_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.py", "");
        write(dir.path(), "a.py", "");
        let registry = default_registry();

        let files = scan(dir.path(), &registry);
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }
}
