//! Error types with fix suggestions
//!
//! Every runtime problem the engine can hit is a [`ComposeError`] variant.
//! Validation errors abort a call immediately; all other kinds are collected
//! into the per-call error list and rendered in the output as a stand-in
//! chosen by policy (verbatim marker, empty string, or an inline diagnostic
//! comment).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Taxonomy tag for a [`ComposeError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    MissingSlot,
    Source,
    Cycle,
    DepthExceeded,
    Callback,
}

impl ErrorKind {
    /// Short lowercase tag used in inline diagnostic markers.
    pub fn tag(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::MissingSlot => "missing-slot",
            ErrorKind::Source => "source",
            ErrorKind::Cycle => "cycle",
            ErrorKind::DepthExceeded => "depth",
            ErrorKind::Callback => "callback",
        }
    }
}

/// All error variants are part of the public API.
#[derive(Error, Debug, Clone)]
pub enum ComposeError {
    #[error("invalid input: {details}")]
    Validation { details: String },

    #[error("no slot value supplied for placeholder '{name}'")]
    MissingSlot {
        name: String,
        source_path: Option<PathBuf>,
    },

    #[error("cannot read '{}': {details}", path.display())]
    Source { path: PathBuf, details: String },

    #[error("dependency cycle: {chain}")]
    Cycle { chain: String },

    #[error("composition depth limit {limit} exceeded: {chain}")]
    DepthExceeded { chain: String, limit: usize },

    #[error("callback for slot '{name}' failed: {details}")]
    Callback { name: String, details: String },
}

impl ComposeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComposeError::Validation { .. } => ErrorKind::Validation,
            ComposeError::MissingSlot { .. } => ErrorKind::MissingSlot,
            ComposeError::Source { .. } => ErrorKind::Source,
            ComposeError::Cycle { .. } => ErrorKind::Cycle,
            ComposeError::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            ComposeError::Callback { .. } => ErrorKind::Callback,
        }
    }

    /// Source path this error is about, when there is one.
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            ComposeError::Source { path, .. } => Some(path),
            ComposeError::MissingSlot { source_path, .. } => source_path.as_deref(),
            _ => None,
        }
    }

    /// Inline stand-in emitted into composed output where a collected error
    /// prevented real content from being produced.
    pub fn diagnostic_marker(&self) -> String {
        format!("<!-- weave:error {}: {} -->", self.kind().tag(), self)
    }

    pub(crate) fn validation(details: impl Into<String>) -> Self {
        ComposeError::Validation {
            details: details.into(),
        }
    }
}

impl FixSuggestion for ComposeError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ComposeError::Validation { .. } => {
                Some("Check the node and slot definitions: each needs exactly one of text or source")
            }
            ComposeError::MissingSlot { .. } => {
                Some("Add a slot value for the placeholder, or set --on-missing-slot ignore to drop it")
            }
            ComposeError::Source { .. } => Some("Check the file path and permissions"),
            ComposeError::Cycle { .. } => {
                Some("Remove the circular reference - a document cannot include itself through any chain")
            }
            ComposeError::DepthExceeded { .. } => {
                Some("Flatten the document tree or raise --max-depth")
            }
            ComposeError::Callback { .. } => Some("Check the callback supplied for this slot"),
        }
    }
}
