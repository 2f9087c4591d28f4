//! Shared content cache keyed by resolved absolute path
//!
//! The cache is caller-supplied and optional. It outlives individual compose
//! calls and may be shared across concurrent calls; a last-write-wins race on
//! a path key is acceptable because content for a given path is assumed
//! idempotent within one process lifetime.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

/// Concurrent path → content map. Values are `Arc<str>` so cache hits share
/// one allocation.
#[derive(Default)]
pub struct ContentCache {
    entries: DashMap<PathBuf, Arc<str>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<str>> {
        self.entries.get(path).map(|e| Arc::clone(&e))
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<Arc<str>>) {
        self.entries.insert(path.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Handle callers keep across compose calls.
pub type SharedCache = Arc<ContentCache>;

pub fn new_shared_cache() -> SharedCache {
    Arc::new(ContentCache::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let cache = ContentCache::new();
        cache.insert("/docs/a.md", "hello");
        assert_eq!(cache.get(Path::new("/docs/a.md")).as_deref(), Some("hello"));
        assert!(cache.get(Path::new("/docs/b.md")).is_none());
    }

    #[test]
    fn hits_share_one_allocation() {
        let cache = ContentCache::new();
        cache.insert("/a", "content");
        let one = cache.get(Path::new("/a")).unwrap();
        let two = cache.get(Path::new("/a")).unwrap();
        assert!(Arc::ptr_eq(&one, &two));
    }
}
