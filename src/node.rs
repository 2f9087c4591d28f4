//! Document nodes and slot values
//!
//! A [`DocumentNode`] carries its body either inline or by source reference,
//! plus a mapping from slot name to [`SlotValue`]. Slot values form a
//! recursive sum type: literal text, a source reference, a callback, or a
//! nested document node with slots of its own.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ComposeError;

/// Slot names must be usable as marker names.
static SLOT_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Injected capability producing slot text, possibly after a delay.
pub type SlotCallback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync>;

/// Where a node's own text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    /// Inline literal text, used as-is.
    Text(String),
    /// Read from a source path through the provider and cache.
    Source(PathBuf),
}

/// What to substitute for a given placeholder name.
#[derive(Clone)]
pub enum SlotValue {
    Text(String),
    Source(PathBuf),
    Callback(SlotCallback),
    Node(Box<DocumentNode>),
}

impl SlotValue {
    pub fn text(text: impl Into<String>) -> Self {
        SlotValue::Text(text.into())
    }

    pub fn source(path: impl Into<PathBuf>) -> Self {
        SlotValue::Source(path.into())
    }

    pub fn node(node: DocumentNode) -> Self {
        SlotValue::Node(Box::new(node))
    }

    /// Wrap an async closure as a callback slot value.
    pub fn callback<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        SlotValue::Callback(Arc::new(move || Box::pin(f())))
    }

    /// Wrap a synchronous closure as a callback slot value.
    pub fn callback_sync<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        SlotValue::Callback(Arc::new(move || {
            let f = Arc::clone(&f);
            Box::pin(async move { f() })
        }))
    }
}

impl fmt::Debug for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Text(t) => f.debug_tuple("Text").field(t).finish(),
            SlotValue::Source(p) => f.debug_tuple("Source").field(p).finish(),
            SlotValue::Callback(_) => f.write_str("Callback(..)"),
            SlotValue::Node(n) => f.debug_tuple("Node").field(n).finish(),
        }
    }
}

/// A document to compose: a body plus named slot values.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub content: NodeContent,
    pub slots: HashMap<String, SlotValue>,
}

impl DocumentNode {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: NodeContent::Text(text.into()),
            slots: HashMap::new(),
        }
    }

    pub fn from_source(path: impl Into<PathBuf>) -> Self {
        Self {
            content: NodeContent::Source(path.into()),
            slots: HashMap::new(),
        }
    }

    /// Attach a slot value. Declaring the same name twice is last-write-wins.
    pub fn with_slot(mut self, name: impl Into<String>, value: SlotValue) -> Self {
        self.slots.insert(name.into(), value);
        self
    }

    /// Fast-fail checks run before any I/O: every slot name (recursively)
    /// must be a valid marker name, or it could never match a placeholder.
    pub fn validate(&self) -> Result<(), ComposeError> {
        for (name, value) in &self.slots {
            if !SLOT_NAME_PATTERN.is_match(name) {
                return Err(ComposeError::validation(format!(
                    "slot name '{name}' is not a valid placeholder name ([A-Za-z0-9_-]+)"
                )));
            }
            if let SlotValue::Node(nested) = value {
                nested.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn builder_round_trip() {
        let node = DocumentNode::from_text("body")
            .with_slot("a", SlotValue::text("x"))
            .with_slot("b", SlotValue::source("frag.md"));
        assert_eq!(node.content, NodeContent::Text("body".into()));
        assert_eq!(node.slots.len(), 2);
    }

    #[test]
    fn duplicate_slot_is_last_write_wins() {
        let node = DocumentNode::from_text("t")
            .with_slot("a", SlotValue::text("first"))
            .with_slot("a", SlotValue::text("second"));
        assert_eq!(node.slots.len(), 1);
        match &node.slots["a"] {
            SlotValue::Text(t) => assert_eq!(t, "second"),
            other => panic!("unexpected slot value: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_bad_slot_names() {
        let node = DocumentNode::from_text("t").with_slot("a b", SlotValue::text("x"));
        let err = node.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn validate_recurses_into_nested_nodes() {
        let nested = DocumentNode::from_text("inner").with_slot("", SlotValue::text("x"));
        let node = DocumentNode::from_text("outer").with_slot("ok", SlotValue::node(nested));
        assert!(node.validate().is_err());
    }

    #[tokio::test]
    async fn sync_callback_wrapper_runs() {
        let value = SlotValue::callback_sync(|| Ok("hello".to_string()));
        match value {
            SlotValue::Callback(cb) => assert_eq!(cb().await.unwrap(), "hello"),
            other => panic!("unexpected slot value: {other:?}"),
        }
    }
}
