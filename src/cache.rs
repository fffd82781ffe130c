//! Parse Cache (spec §4.4): memoizes `SymbolTree`s keyed by `(path, mtime)`.
//! A bespoke move-to-end LRU over `indexmap::IndexMap`, bounded at a fixed
//! capacity — the teacher already depends on `indexmap`, so this reuses
//! that rather than pulling in a dedicated LRU crate (spec invariant 10:
//! stale-mtime entries are misses, not stale hits).

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::model::SymbolTree;

/// Default bound on resident entries before the least-recently-used one is
/// evicted.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    mtime: SystemTime,
}

struct Entry {
    tree: SymbolTree,
}

/// Thread-safe parse cache. `get` only returns a hit when the stored mtime
/// matches exactly; any other mtime is treated as a fresh file and the
/// caller is expected to reparse and `set`.
pub struct ParseCache {
    capacity: usize,
    entries: Mutex<IndexMap<CacheKey, Entry>>,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn get(&self, path: &Path, mtime: SystemTime) -> Option<SymbolTree> {
        let key = CacheKey {
            path: path.to_path_buf(),
            mtime,
        };
        let mut entries = self.entries.lock();
        let (index, _, entry) = entries.get_full(&key)?;
        let tree = entry.tree.clone();
        // Move-to-end marks this key as most-recently-used.
        entries.move_index(index, entries.len() - 1);
        Some(tree)
    }

    pub fn set(&self, path: &Path, mtime: SystemTime, tree: SymbolTree) {
        let key = CacheKey {
            path: path.to_path_buf(),
            mtime,
        };
        let mut entries = self.entries.lock();
        // Any stale entry for this path (different mtime) is removed first,
        // so a re-parse doesn't leave a dead entry behind under memory
        // pressure.
        entries.retain(|k, _| k.path != key.path || k.mtime == key.mtime);
        entries.insert(key, Entry { tree });
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
    }

    pub fn invalidate(&self, path: &Path) {
        let mut entries = self.entries.lock();
        entries.retain(|k, _| k.path != path);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SyntaxError;
    use std::time::Duration;

    fn empty_tree(path: &str) -> SymbolTree {
        SymbolTree {
            path: PathBuf::from(path),
            language: "rust".into(),
            symbols: Vec::new(),
            errors: Vec::<SyntaxError>::new(),
        }
    }

    #[test]
    fn hit_on_matching_mtime() {
        let cache = ParseCache::new(10);
        let mtime = SystemTime::now();
        cache.set(Path::new("a.rs"), mtime, empty_tree("a.rs"));
        assert!(cache.get(Path::new("a.rs"), mtime).is_some());
    }

    #[test]
    fn miss_when_mtime_changed() {
        let cache = ParseCache::new(10);
        let mtime = SystemTime::now();
        cache.set(Path::new("a.rs"), mtime, empty_tree("a.rs"));
        let bumped = mtime + Duration::from_secs(1);
        assert!(cache.get(Path::new("a.rs"), bumped).is_none());
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let cache = ParseCache::new(2);
        let mtime = SystemTime::now();
        cache.set(Path::new("a.rs"), mtime, empty_tree("a.rs"));
        cache.set(Path::new("b.rs"), mtime, empty_tree("b.rs"));
        // touch a.rs so b.rs becomes the LRU entry
        cache.get(Path::new("a.rs"), mtime);
        cache.set(Path::new("c.rs"), mtime, empty_tree("c.rs"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(Path::new("b.rs"), mtime).is_none());
        assert!(cache.get(Path::new("a.rs"), mtime).is_some());
        assert!(cache.get(Path::new("c.rs"), mtime).is_some());
    }

    #[test]
    fn invalidate_removes_all_entries_for_a_path() {
        let cache = ParseCache::new(10);
        let mtime = SystemTime::now();
        cache.set(Path::new("a.rs"), mtime, empty_tree("a.rs"));
        cache.invalidate(Path::new("a.rs"));
        assert!(cache.get(Path::new("a.rs"), mtime).is_none());
    }
}
