//! Scored node types for relevance-weighted results.
//!
//! This module provides [`ScoredNode`], a structural node paired with a
//! full-text relevance score. Scored nodes are produced only when scoring
//! is enabled on the evaluation context.

use serde::{Deserialize, Serialize};

use super::node::{Node, NodeId};

/// A node with an associated relevance score in `[0, 1]`.
///
/// # Example
///
/// ```
/// use xylo_core::types::{Node, NodeId, NodeKind, ScoredNode};
///
/// let node = Node::new(NodeId::new(1), NodeKind::Text);
/// let scored = ScoredNode::new(node, 0.85);
/// assert_eq!(scored.score, 0.85);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredNode {
    /// The node reference.
    pub node: Node,
    /// The relevance score, clamped to `[0, 1]`.
    pub score: f64,
}

impl ScoredNode {
    /// Creates a new scored node, clamping the score to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn new(node: Node, score: f64) -> Self {
        Self { node, score: score.clamp(0.0, 1.0) }
    }

    /// Returns the node identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.node.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn score_is_clamped() {
        let node = Node::new(NodeId::new(1), NodeKind::Text);
        assert_eq!(ScoredNode::new(node, 1.5).score, 1.0);
        assert_eq!(ScoredNode::new(node, -0.1).score, 0.0);
        assert_eq!(ScoredNode::new(node, 0.5).score, 0.5);
    }
}
