//! Composition engine
//!
//! [`Composer::compose`] drives the per-node resolution algorithm: obtain the
//! node's text (inline, or through the source provider with cycle/depth
//! guarding and cache read-through), resolve a value for every distinct
//! placeholder name found in it, substitute, and always pop the tracker on
//! the way out. Runtime errors are collected into the call's error list and
//! stood in for in the output; only hard policies or invalid input abort a
//! call.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::ComposeError;
use crate::node::{DocumentNode, NodeContent, SlotValue};
use crate::options::{ComposeOptions, FileErrorPolicy, MissingSlotPolicy, ResolveFrom};
use crate::parser::ParsedDocument;
use crate::source::{FsSource, SourceProvider};
use crate::tracker::DependencyTracker;

/// Best-effort composed text plus every problem hit along the way.
#[derive(Debug)]
pub struct Composed {
    pub text: String,
    pub errors: Vec<ComposeError>,
}

impl Composed {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-call state threaded through every recursive resolution. Never shared
/// across top-level calls.
struct ResolutionContext {
    tracker: DependencyTracker,
    errors: Vec<ComposeError>,
}

impl ResolutionContext {
    fn new(max_depth: usize) -> Self {
        Self {
            tracker: DependencyTracker::new(max_depth),
            errors: Vec::new(),
        }
    }

    fn record(&mut self, err: &ComposeError) {
        warn!(kind = ?err.kind(), "{err}");
        self.errors.push(err.clone());
    }

    /// Independent context for one parallel sibling: same ancestor chain,
    /// its own error list.
    fn branch(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            errors: Vec::new(),
        }
    }

    fn merge(&mut self, child: ResolutionContext) {
        self.tracker.absorb_visited(&child.tracker);
        self.errors.extend(child.errors);
    }
}

/// Outcome of fetching source-backed text.
enum Fetched {
    /// Text obtained; the path is still on the tracker and the caller owns
    /// the matching pop.
    Text { abs: PathBuf, text: String },
    /// A collected error already produced a stand-in; nothing left to pop.
    Handled(String),
}

pub struct Composer {
    provider: Arc<dyn SourceProvider>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    /// Composer backed by the filesystem.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(FsSource))
    }

    pub fn with_provider(provider: Arc<dyn SourceProvider>) -> Self {
        Self { provider }
    }

    /// Compose one document tree. Returns `Err` only for invalid input or
    /// when a hard policy (`on_missing_slot = error`, `on_file_error =
    /// throw`) escalates a collected error.
    pub async fn compose(
        &self,
        node: &DocumentNode,
        options: &ComposeOptions,
    ) -> Result<Composed, ComposeError> {
        node.validate()?;
        let base = match &options.base_path {
            Some(p) => p.clone(),
            None => std::env::current_dir().map_err(|e| {
                ComposeError::validation(format!("cannot determine working directory: {e}"))
            })?,
        };

        let mut ctx = ResolutionContext::new(options.max_depth);
        let text = self.resolve_node(node, &base, options, &mut ctx).await?;
        Ok(Composed {
            text,
            errors: ctx.errors,
        })
    }

    /// Full per-node algorithm. `base` is the directory this node's own
    /// relative source resolves against.
    fn resolve_node<'a>(
        &'a self,
        node: &'a DocumentNode,
        base: &'a Path,
        options: &'a ComposeOptions,
        ctx: &'a mut ResolutionContext,
    ) -> BoxFuture<'a, Result<String, ComposeError>> {
        async move {
            let (text, node_dir, pushed) = match &node.content {
                NodeContent::Text(t) => (t.clone(), None, false),
                NodeContent::Source(path) => {
                    match self.fetch_source(path, base, options, ctx).await? {
                        Fetched::Text { abs, text } => {
                            let dir = abs.parent().map(Path::to_path_buf);
                            (text, dir, true)
                        }
                        Fetched::Handled(stand_in) => return Ok(stand_in),
                    }
                }
            };

            // In file mode, children resolve against this document's own
            // directory; literal nodes inherit the caller's base.
            let child_base = match (options.resolve_from, &node_dir) {
                (ResolveFrom::File, Some(dir)) => dir.clone(),
                _ => base.to_path_buf(),
            };

            let out = self.fill_slots(node, &text, &child_base, options, ctx).await;
            if pushed {
                // Matched pop on every exit path, so sibling branches of the
                // caller are unaffected.
                ctx.tracker.pop();
            }
            out
        }
        .boxed()
    }

    /// Resolve, guard, and read one source path. Shared by source-backed
    /// nodes and source-reference slot values.
    async fn fetch_source(
        &self,
        raw: &Path,
        base: &Path,
        options: &ComposeOptions,
        ctx: &mut ResolutionContext,
    ) -> Result<Fetched, ComposeError> {
        let abs = self.provider.resolve(raw, base);
        debug!(path = %abs.display(), depth = ctx.tracker.depth(), "fetching source");

        if let Err(err) = ctx.tracker.check_and_push(&abs) {
            ctx.record(&err);
            if options.on_missing_slot == MissingSlotPolicy::Error {
                return Err(err);
            }
            return Ok(Fetched::Handled(err.diagnostic_marker()));
        }

        if !self.provider.exists(&abs).await {
            let err = ComposeError::Source {
                path: abs.clone(),
                details: "source not found".to_string(),
            };
            ctx.record(&err);
            ctx.tracker.pop();
            return match options.on_file_error {
                FileErrorPolicy::Throw => Err(err),
                FileErrorPolicy::WarnEmpty => Ok(Fetched::Handled(String::new())),
            };
        }

        if let Some(cache) = &options.cache {
            if let Some(text) = cache.get(&abs) {
                debug!(path = %abs.display(), "cache hit");
                return Ok(Fetched::Text {
                    text: text.to_string(),
                    abs,
                });
            }
        }

        match self.provider.read(&abs).await {
            Ok(text) => {
                if let Some(cache) = &options.cache {
                    cache.insert(abs.clone(), text.as_str());
                }
                Ok(Fetched::Text { abs, text })
            }
            Err(err) => {
                ctx.record(&err);
                ctx.tracker.pop();
                match options.on_file_error {
                    FileErrorPolicy::Throw => Err(err),
                    FileErrorPolicy::WarnEmpty => Ok(Fetched::Handled(String::new())),
                }
            }
        }
    }

    /// Resolve every distinct placeholder name in `text` and substitute.
    async fn fill_slots(
        &self,
        node: &DocumentNode,
        text: &str,
        base: &Path,
        options: &ComposeOptions,
        ctx: &mut ResolutionContext,
    ) -> Result<String, ComposeError> {
        let parsed = ParsedDocument::parse(text);
        if !parsed.has_placeholders() {
            return Ok(text.to_string());
        }

        // Distinct names in left-to-right discovery order.
        let mut names: Vec<&str> = Vec::new();
        for ph in parsed.placeholders() {
            if !names.contains(&ph.name.as_str()) {
                names.push(&ph.name);
            }
        }

        let mut replacements: HashMap<String, String> = HashMap::new();

        if options.parallel {
            // Fan out over independent branches, join, then merge back in
            // discovery order. Substitution order is unaffected by
            // completion order; under a hard policy the first failure in
            // discovery order propagates after every sibling finished.
            let joined = join_all(names.iter().map(|&name| {
                let mut branch = ctx.branch();
                async move {
                    let outcome = self
                        .resolve_slot(node, name, base, options, &mut branch)
                        .await;
                    (outcome, branch)
                }
            }))
            .await;

            let mut first_failure = None;
            for (&name, (outcome, branch)) in names.iter().zip(joined) {
                ctx.merge(branch);
                match outcome {
                    Ok(Some(value)) => {
                        replacements.insert(name.to_string(), value);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        if first_failure.is_none() {
                            first_failure = Some(err);
                        }
                    }
                }
            }
            if let Some(err) = first_failure {
                return Err(err);
            }
        } else {
            for &name in &names {
                if let Some(value) = self.resolve_slot(node, name, base, options, ctx).await? {
                    replacements.insert(name.to_string(), value);
                }
            }
        }

        Ok(parsed.substitute(&replacements))
    }

    /// Determine the replacement for one placeholder name. `Ok(None)` means
    /// "no mapping": the marker stays verbatim.
    async fn resolve_slot(
        &self,
        node: &DocumentNode,
        name: &str,
        base: &Path,
        options: &ComposeOptions,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<String>, ComposeError> {
        let Some(value) = node.slots.get(name) else {
            let source_path = match &node.content {
                NodeContent::Source(p) => Some(p.clone()),
                NodeContent::Text(_) => None,
            };
            let err = ComposeError::MissingSlot {
                name: name.to_string(),
                source_path,
            };
            ctx.record(&err);
            return match options.on_missing_slot {
                MissingSlotPolicy::Error => Err(err),
                MissingSlotPolicy::Ignore => Ok(Some(String::new())),
                MissingSlotPolicy::Keep => Ok(None),
            };
        };

        match value {
            SlotValue::Text(t) => Ok(Some(t.clone())),

            // Same guarded fetch path as a source-backed node; the text is
            // substituted as an opaque block, not re-scanned at this level.
            SlotValue::Source(path) => {
                match self.fetch_source(path, base, options, ctx).await? {
                    Fetched::Text { text, .. } => {
                        ctx.tracker.pop();
                        Ok(Some(text))
                    }
                    Fetched::Handled(stand_in) => Ok(Some(stand_in)),
                }
            }

            SlotValue::Callback(cb) => match AssertUnwindSafe(cb()).catch_unwind().await {
                Ok(Ok(text)) => Ok(Some(text)),
                Ok(Err(e)) => {
                    let err = ComposeError::Callback {
                        name: name.to_string(),
                        details: e.to_string(),
                    };
                    ctx.record(&err);
                    Ok(Some(err.diagnostic_marker()))
                }
                Err(panic) => {
                    let details = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "callback panicked".to_string());
                    let err = ComposeError::Callback {
                        name: name.to_string(),
                        details,
                    };
                    ctx.record(&err);
                    Ok(Some(err.diagnostic_marker()))
                }
            },

            // Full recursion: shares the tracker, depth budget, and error
            // list with the parent.
            SlotValue::Node(nested) => self
                .resolve_node(nested, base, options, ctx)
                .await
                .map(Some),
        }
    }
}

/// Compose with the filesystem provider.
pub async fn compose(
    node: &DocumentNode,
    options: &ComposeOptions,
) -> Result<Composed, ComposeError> {
    Composer::new().compose(node, options).await
}
