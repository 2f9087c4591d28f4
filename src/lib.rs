//! Weave - recursive document composition
//!
//! Fills `<!-- outlet: name -->` / `<!-- slot: name -->` markers in text
//! documents with content from literal strings, other documents, callbacks,
//! or nested documents, recursively, with cycle and depth guarding and
//! structured error collection instead of crashes.
//!
//! ```no_run
//! use weave::{compose, ComposeOptions, DocumentNode, SlotValue};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let node = DocumentNode::from_text("# Guide\n<!-- outlet: intro -->")
//!     .with_slot("intro", SlotValue::source("fragments/intro.md"));
//! let out = compose(&node, &ComposeOptions::default()).await?;
//! println!("{}", out.text);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod node;
pub mod options;
pub mod parser;
pub mod source;
pub mod tracker;

pub use cache::{new_shared_cache, ContentCache, SharedCache};
pub use engine::{compose, Composed, Composer};
pub use error::{ComposeError, ErrorKind, FixSuggestion};
pub use node::{DocumentNode, NodeContent, SlotCallback, SlotValue};
pub use options::{
    ComposeOptions, FileErrorPolicy, MissingSlotPolicy, ResolveFrom, DEFAULT_MAX_DEPTH,
};
pub use parser::{find_placeholders, has_placeholders, ParsedDocument, Placeholder};
pub use source::{FsSource, MemorySource, SourceProvider};
pub use tracker::DependencyTracker;
