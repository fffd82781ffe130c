//! File Abstraction (spec §4.1): read, stat, exists, list — the only layer
//! allowed to touch the real filesystem. No caching here; the Parse Cache
//! sits above it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Default per-file size cap (SPEC_FULL.md §4.1): files larger than this are
/// skipped with a logged warning rather than read into memory.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// mtime + size as reported by the OS, the cache key ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mtime: SystemTime,
    pub size: u64,
}

/// One entry in a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Resolves workspace-relative paths against a stored root and performs
/// the actual I/O. Absolute paths pass through untouched.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    max_file_bytes: u64,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(root: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_file_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a possibly-relative path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Workspace-relative path, forward-slashed regardless of host (spec §6).
    pub fn relativize(&self, path: &Path) -> PathBuf {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        PathBuf::from(rel.to_string_lossy().replace('\\', "/"))
    }

    pub fn read(&self, path: &Path) -> EngineResult<String> {
        let resolved = self.resolve(path);
        let meta = fs::metadata(&resolved).map_err(|source| EngineError::Io {
            path: resolved.clone(),
            source,
        })?;
        if meta.len() > self.max_file_bytes {
            warn!(
                path = %resolved.display(),
                size = meta.len(),
                cap = self.max_file_bytes,
                "skipping file that exceeds the configured size cap"
            );
            return Err(EngineError::Io {
                path: resolved,
                source: std::io::Error::other("file exceeds the configured max_file_bytes cap"),
            });
        }
        fs::read_to_string(&resolved).map_err(|source| EngineError::Io {
            path: resolved,
            source,
        })
    }

    pub fn stats(&self, path: &Path) -> EngineResult<FileStat> {
        let resolved = self.resolve(path);
        let meta = fs::metadata(&resolved).map_err(|source| EngineError::Io {
            path: resolved.clone(),
            source,
        })?;
        let mtime = meta.modified().map_err(|source| EngineError::Io {
            path: resolved,
            source,
        })?;
        Ok(FileStat {
            mtime,
            size: meta.len(),
        })
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    pub fn list_directory(&self, path: &Path) -> EngineResult<Vec<DirEntry>> {
        let resolved = self.resolve(path);
        let read_dir = fs::read_dir(&resolved).map_err(|source| EngineError::Io {
            path: resolved.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| EngineError::Io {
                path: resolved.clone(),
                source,
            })?;
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                path: entry.path(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[test]
    fn read_resolves_relative_paths_against_root() {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        let ws = Workspace::new(dir.path());

        let content = ws.read(Path::new("a.rs")).unwrap();
        assert_eq!(content, "fn main() {}");
    }

    #[test]
    fn read_skips_files_over_the_size_cap() {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();
        let ws = Workspace::with_max_file_bytes(dir.path(), 10);

        let err = ws.read(Path::new("big.rs")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IoError);
    }

    #[test]
    fn stats_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let err = ws.stats(Path::new("missing.rs")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IoError);
    }

    #[test]
    fn list_directory_sorted_and_flags_dirs() {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("b.rs"), "").unwrap();
        stdfs::write(dir.path().join("a.rs"), "").unwrap();
        stdfs::create_dir(dir.path().join("sub")).unwrap();
        let ws = Workspace::new(dir.path());

        let entries = ws.list_directory(Path::new(".")).unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "sub"]);
        assert!(entries.iter().find(|e| e.path.ends_with("sub")).unwrap().is_dir);
    }

    #[test]
    fn relativize_forward_slashes() {
        let ws = Workspace::new("/workspace");
        let rel = ws.relativize(Path::new("/workspace/src/main.rs"));
        assert_eq!(rel, PathBuf::from("src/main.rs"));
    }
}
