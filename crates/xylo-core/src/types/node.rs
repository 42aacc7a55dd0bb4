//! Structural node references and document order.
//!
//! This module provides the [`Node`] type, a lightweight reference to a
//! position in a stored or constructed document. Nodes are identified by a
//! monotonically increasing document-order key (the *pre* value) together
//! with a node-kind tag.
//!
//! # Example
//!
//! ```
//! use xylo_core::types::{Node, NodeId, NodeKind};
//!
//! let a = Node::new(NodeId::new(3), NodeKind::Element);
//! let b = Node::new(NodeId::new(7), NodeKind::Text);
//!
//! // b follows a in document order
//! assert!(b.diff(&a) > 0);
//! assert!(a.diff(&b) < 0);
//! assert_eq!(a.diff(&a), 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A document-order key identifying a node within one document.
///
/// Keys are assigned in parse/construction order, so comparing two keys from
/// the same document compares their document positions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a new node id from a raw pre value.
    #[inline]
    #[must_use]
    pub const fn new(pre: u64) -> Self {
        Self(pre)
    }

    /// Returns the raw pre value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline]
    fn from(pre: u64) -> Self {
        Self(pre)
    }
}

/// The kind of a structural node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document root node.
    Document,
    /// Element node.
    Element,
    /// Text node.
    Text,
    /// Attribute node.
    Attribute,
    /// Comment node.
    Comment,
    /// Processing instruction node.
    Pi,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Element => "element",
            Self::Text => "text",
            Self::Attribute => "attribute",
            Self::Comment => "comment",
            Self::Pi => "processing-instruction",
        };
        write!(f, "{name}")
    }
}

/// A reference to a structural node: document-order key plus kind tag.
///
/// Two references from the same document compare by document position via
/// [`Node::diff`]. Node identity is the id alone; the kind tag is carried for
/// consumers that need to materialize the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// The document-order key.
    pub id: NodeId,
    /// The node kind.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node reference.
    #[inline]
    #[must_use]
    pub const fn new(id: NodeId, kind: NodeKind) -> Self {
        Self { id, kind }
    }

    /// Compares two nodes by document position.
    ///
    /// Returns a value `> 0` iff `self` follows `other` in document order,
    /// `< 0` iff it precedes it, and `0` iff both reference the same node.
    /// Only meaningful for nodes of the same document.
    #[inline]
    #[must_use]
    pub fn diff(&self, other: &Self) -> i64 {
        // Pre values fit in i64 for any realistic document.
        self.id.as_u64() as i64 - other.id.as_u64() as i64
    }
}

impl PartialOrd for Node {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}
