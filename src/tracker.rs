//! Dependency tracker: active resolution chain, cycle and depth guard
//!
//! One tracker belongs to exactly one top-level compose call. The stack is
//! the active chain of source paths being resolved; the visited set keeps
//! every path touched by the call, surviving pops, for diagnostics.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ComposeError;

#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    stack: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    max_depth: usize,
}

impl DependencyTracker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Admit `path` onto the active chain.
    ///
    /// Fails with [`ComposeError::DepthExceeded`] when the stack is already
    /// at the depth limit, then with [`ComposeError::Cycle`] when `path` is
    /// already anywhere on the active chain. On success the path is pushed
    /// and recorded in the visited set.
    pub fn check_and_push(&mut self, path: &Path) -> Result<(), ComposeError> {
        if self.stack.len() >= self.max_depth {
            return Err(ComposeError::DepthExceeded {
                chain: chain_display(&self.stack, path),
                limit: self.max_depth,
            });
        }
        if let Some(pos) = self.stack.iter().position(|p| p == path) {
            return Err(ComposeError::Cycle {
                chain: chain_display(&self.stack[pos..], path),
            });
        }
        self.stack.push(path.to_path_buf());
        self.visited.insert(path.to_path_buf());
        Ok(())
    }

    /// Remove the most recently pushed entry. No-op on an empty stack.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Reset stack and visited set for reuse across independent calls.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.visited.clear();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn active_chain(&self) -> &[PathBuf] {
        &self.stack
    }

    /// Every path touched by this call, retained across pops.
    pub fn visited(&self) -> &HashSet<PathBuf> {
        &self.visited
    }

    /// Fold a parallel sibling branch's visited set back in after a join.
    pub(crate) fn absorb_visited(&mut self, other: &DependencyTracker) {
        self.visited.extend(other.visited.iter().cloned());
    }
}

fn chain_display(stack: &[PathBuf], offending: &Path) -> String {
    let mut parts: Vec<String> = stack.iter().map(|p| p.display().to_string()).collect();
    parts.push(offending.display().to_string());
    parts.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn push_then_pop_round_trip() {
        let mut tracker = DependencyTracker::new(10);
        tracker.check_and_push(Path::new("a.md")).unwrap();
        tracker.check_and_push(Path::new("b.md")).unwrap();
        assert_eq!(tracker.depth(), 2);
        tracker.pop();
        assert_eq!(tracker.depth(), 1);
        tracker.pop();
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn pop_on_empty_is_a_no_op() {
        let mut tracker = DependencyTracker::new(10);
        tracker.pop();
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn duplicate_path_on_active_chain_is_a_cycle() {
        let mut tracker = DependencyTracker::new(10);
        tracker.check_and_push(Path::new("a.md")).unwrap();
        tracker.check_and_push(Path::new("b.md")).unwrap();
        let err = tracker.check_and_push(Path::new("a.md")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert_eq!(err.to_string(), "dependency cycle: a.md -> b.md -> a.md");
    }

    #[test]
    fn cycle_chain_starts_at_first_occurrence() {
        let mut tracker = DependencyTracker::new(10);
        for p in ["root.md", "a.md", "b.md"] {
            tracker.check_and_push(Path::new(p)).unwrap();
        }
        let err = tracker.check_and_push(Path::new("b.md")).unwrap_err();
        assert!(err.to_string().contains("b.md -> b.md"));
        assert!(!err.to_string().contains("root.md"));
    }

    #[test]
    fn repushing_after_pop_is_fine() {
        let mut tracker = DependencyTracker::new(10);
        tracker.check_and_push(Path::new("a.md")).unwrap();
        tracker.pop();
        tracker.check_and_push(Path::new("a.md")).unwrap();
    }

    #[test]
    fn depth_limit_is_enforced_before_cycle_check() {
        let mut tracker = DependencyTracker::new(2);
        tracker.check_and_push(Path::new("a.md")).unwrap();
        tracker.check_and_push(Path::new("b.md")).unwrap();
        // At the limit even a repeated path reports depth, not cycle.
        let err = tracker.check_and_push(Path::new("a.md")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
        assert!(err.to_string().contains("a.md -> b.md -> a.md"));
    }

    #[test]
    fn zero_depth_rejects_everything() {
        let mut tracker = DependencyTracker::new(0);
        let err = tracker.check_and_push(Path::new("a.md")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn visited_survives_pops() {
        let mut tracker = DependencyTracker::new(10);
        tracker.check_and_push(Path::new("a.md")).unwrap();
        tracker.pop();
        assert!(tracker.visited().contains(Path::new("a.md")));
        tracker.clear();
        assert!(tracker.visited().is_empty());
    }
}
