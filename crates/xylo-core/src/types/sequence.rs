//! Ordered, duplicate-free node sequences.
//!
//! [`NodeSeq`] is the result container for every set operation in the query
//! engine. Its invariant: nodes are sorted in ascending document order with
//! no duplicate identities. Constructors either establish the invariant by
//! sorting and deduplicating, or assert it in debug builds when the caller
//! guarantees it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::{Node, NodeId};

/// An ordered, deduplicated-by-identity collection of node references.
///
/// # Example
///
/// ```
/// use xylo_core::types::{Node, NodeId, NodeKind, NodeSeq};
///
/// let seq = NodeSeq::from_nodes(vec![
///     Node::new(NodeId::new(7), NodeKind::Text),
///     Node::new(NodeId::new(2), NodeKind::Element),
///     Node::new(NodeId::new(7), NodeKind::Text),
/// ]);
///
/// assert_eq!(seq.len(), 2);
/// assert_eq!(seq.get(0).unwrap().id.as_u64(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSeq {
    nodes: Vec<Node>,
}

impl NodeSeq {
    /// Creates an empty sequence.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Creates a sequence from arbitrary nodes, sorting by document order
    /// and removing duplicate identities.
    #[must_use]
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        nodes.sort();
        nodes.dedup_by_key(|n| n.id);
        Self { nodes }
    }

    /// Creates a sequence from nodes the caller guarantees to be sorted in
    /// document order without duplicates.
    #[must_use]
    pub fn from_sorted_unchecked(nodes: Vec<Node>) -> Self {
        debug_assert!(nodes.windows(2).all(|w| w[0].id < w[1].id));
        Self { nodes }
    }

    /// Returns the number of nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the sequence is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `index`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Returns the first node, if any.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Returns the last node, if any.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Returns true if a node with the given identity is present.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.binary_search_by_key(&id, |n| n.id).is_ok()
    }

    /// Appends a node the caller guarantees to follow the current last node
    /// in document order.
    pub fn push_unchecked(&mut self, node: Node) {
        debug_assert!(self.nodes.last().map_or(true, |l| l.id < node.id));
        self.nodes.push(node);
    }

    /// Iterates over the nodes in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Consumes the sequence and returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    /// Returns the nodes as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }
}

impl<'a> IntoIterator for &'a NodeSeq {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl IntoIterator for NodeSeq {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl FromIterator<Node> for NodeSeq {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::from_nodes(iter.into_iter().collect())
    }
}

impl fmt::Display for NodeSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, ")")
    }
}
