//! Source providers: how the engine obtains document text by path
//!
//! [`FsSource`] is the production provider (async filesystem reads).
//! [`MemorySource`] backs sources with an in-memory map, for embedders and
//! tests.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::ComposeError;

#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Read the full text behind `path`, which is already resolved.
    async fn read(&self, path: &Path) -> Result<String, ComposeError>;

    async fn exists(&self, path: &Path) -> bool;

    /// Resolve `path` against `base`. Absolute paths pass through unchanged
    /// (modulo lexical normalization, so `a.md` and `./a.md` key the tracker
    /// and cache identically).
    fn resolve(&self, path: &Path, base: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&base.join(path))
        }
    }
}

/// Lexical cleanup: drops `.` components and folds `..` into its parent
/// without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Filesystem-backed provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

#[async_trait]
impl SourceProvider for FsSource {
    async fn read(&self, path: &Path) -> Result<String, ComposeError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ComposeError::Source {
                path: path.to_path_buf(),
                details: e.to_string(),
            })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// In-memory provider: a path → text map.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: DashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.entries.insert(path.into(), text.into());
    }
}

#[async_trait]
impl SourceProvider for MemorySource {
    async fn read(&self, path: &Path) -> Result<String, ComposeError> {
        self.entries
            .get(path)
            .map(|e| e.clone())
            .ok_or_else(|| ComposeError::Source {
                path: path.to_path_buf(),
                details: "no such entry".to_string(),
            })
    }

    async fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }
}
