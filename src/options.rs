//! Compose options and failure policies

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Deserialize;

use crate::cache::SharedCache;

/// Default depth limit for the resolution stack.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// What to do when a placeholder has no supplied slot value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingSlotPolicy {
    /// Abort the whole call on the first missing slot.
    Error,
    /// Map the name to empty text; the marker is removed.
    Ignore,
    /// Provide no mapping; the marker is left verbatim.
    Keep,
}

/// What to do when a backing source is absent or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FileErrorPolicy {
    /// Abort the whole call with the source error.
    Throw,
    /// Record the error, use empty text, and continue.
    WarnEmpty,
}

/// How relative source paths are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveFrom {
    /// Against the working context (`base_path`, or the process cwd).
    Cwd,
    /// Against the directory of the parent document.
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ComposeOptions {
    /// Base directory for relative source paths. Defaults to the process
    /// working directory when unset.
    pub base_path: Option<PathBuf>,
    pub resolve_from: ResolveFrom,
    pub max_depth: usize,
    pub on_missing_slot: MissingSlotPolicy,
    pub on_file_error: FileErrorPolicy,
    pub parallel: bool,
    /// Optional shared content cache, read-checked then written through.
    #[serde(skip)]
    pub cache: Option<SharedCache>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            resolve_from: ResolveFrom::Cwd,
            max_depth: DEFAULT_MAX_DEPTH,
            on_missing_slot: MissingSlotPolicy::Keep,
            on_file_error: FileErrorPolicy::WarnEmpty,
            parallel: false,
            cache: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let opts = ComposeOptions::default();
        assert_eq!(opts.max_depth, 10);
        assert_eq!(opts.on_missing_slot, MissingSlotPolicy::Keep);
        assert_eq!(opts.on_file_error, FileErrorPolicy::WarnEmpty);
        assert_eq!(opts.resolve_from, ResolveFrom::Cwd);
        assert!(!opts.parallel);
        assert!(opts.cache.is_none());
        assert!(opts.base_path.is_none());
    }

    #[test]
    fn deserializes_from_camel_case_json() {
        let opts: ComposeOptions = serde_json::from_str(
            r#"{"maxDepth": 3, "onMissingSlot": "ignore", "onFileError": "throw",
                "resolveFrom": "file", "parallel": true}"#,
        )
        .unwrap();
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.on_missing_slot, MissingSlotPolicy::Ignore);
        assert_eq!(opts.on_file_error, FileErrorPolicy::Throw);
        assert_eq!(opts.resolve_from, ResolveFrom::File);
        assert!(opts.parallel);
    }

    #[test]
    fn negative_max_depth_is_rejected_at_the_boundary() {
        let result = serde_json::from_str::<ComposeOptions>(r#"{"maxDepth": -1}"#);
        assert!(result.is_err());
    }
}
