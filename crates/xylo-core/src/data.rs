//! Storage access for query evaluation.
//!
//! [`Data`] is the seam between the query layer and a concrete store.
//! It exposes exactly what index-driven evaluation needs: a cost
//! estimate for a lookup and an iterator over the matching nodes.
//! [`MemData`] is an in-memory implementation used in tests and small
//! documents.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::index::{IndexKind, NumericRange, StringRange};
use crate::types::Node;

/// Abstract access to a document store and its value indexes.
///
/// Iterators return nodes in the index's native iteration order, which
/// is not necessarily document order; callers needing document order
/// must sort. A node may appear once per distinct key it is indexed
/// under.
pub trait Data: Send + Sync {
    /// Estimates the number of nodes a numeric lookup would return.
    ///
    /// A result of `0` is a guarantee: the lookup matches nothing and
    /// callers may replace the expression with an empty sequence.
    /// Non-zero results are estimates used for cost ordering.
    fn lookup_cost(&self, range: &NumericRange) -> usize;

    /// Iterates over the nodes matching `range` in index order.
    fn iter<'a>(&'a self, range: &NumericRange) -> Box<dyn Iterator<Item = Node> + 'a>;

    /// Estimates the number of nodes a string lookup would return.
    ///
    /// The `0` sentinel carries the same guarantee as for
    /// [`Data::lookup_cost`].
    fn string_lookup_cost(&self, range: &StringRange) -> usize;

    /// Iterates over the nodes matching `range` in index order.
    fn string_iter<'a>(&'a self, range: &StringRange) -> Box<dyn Iterator<Item = Node> + 'a>;

    /// Total number of nodes in the store.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory [`Data`] implementation backed by sorted postings.
///
/// Numeric keys are stored as ordered bit patterns so that `f64`
/// values can live in a `BTreeMap` without losing total ordering for
/// the finite values queries use; string keys are stored directly.
///
/// # Example
///
/// ```
/// use xylo_core::{IndexKind, MemData, Node, NodeId, NodeKind, NumericRange, Data};
///
/// let mut data = MemData::new();
/// data.insert(IndexKind::Text, 5.0, Node::new(NodeId::new(3), NodeKind::Text));
/// data.insert(IndexKind::Text, 7.0, Node::new(NodeId::new(1), NodeKind::Text));
///
/// let range = NumericRange::new(IndexKind::Text, 0.0, 10.0);
/// assert_eq!(data.lookup_cost(&range), 2);
/// let hits: Vec<_> = data.iter(&range).collect();
/// assert_eq!(hits[0].id.as_u64(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemData {
    text: BTreeMap<u64, Vec<Node>>,
    attribute: BTreeMap<u64, Vec<Node>>,
    text_str: BTreeMap<String, Vec<Node>>,
    attribute_str: BTreeMap<String, Vec<Node>>,
    len: usize,
}

impl MemData {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node under the numeric key `value` in the index for
    /// `kind`.
    pub fn insert(&mut self, kind: IndexKind, value: f64, node: Node) {
        let key = ordered_bits(value);
        self.postings_mut(kind).entry(key).or_default().push(node);
        self.len += 1;
    }

    /// Inserts a node under the string key `value` in the index for
    /// `kind`.
    pub fn insert_str(&mut self, kind: IndexKind, value: impl Into<String>, node: Node) {
        self.string_postings_mut(kind).entry(value.into()).or_default().push(node);
        self.len += 1;
    }

    fn postings(&self, kind: IndexKind) -> &BTreeMap<u64, Vec<Node>> {
        match kind {
            IndexKind::Text => &self.text,
            IndexKind::Attribute => &self.attribute,
        }
    }

    fn postings_mut(&mut self, kind: IndexKind) -> &mut BTreeMap<u64, Vec<Node>> {
        match kind {
            IndexKind::Text => &mut self.text,
            IndexKind::Attribute => &mut self.attribute,
        }
    }

    fn string_postings(&self, kind: IndexKind) -> &BTreeMap<String, Vec<Node>> {
        match kind {
            IndexKind::Text => &self.text_str,
            IndexKind::Attribute => &self.attribute_str,
        }
    }

    fn string_postings_mut(&mut self, kind: IndexKind) -> &mut BTreeMap<String, Vec<Node>> {
        match kind {
            IndexKind::Text => &mut self.text_str,
            IndexKind::Attribute => &mut self.attribute_str,
        }
    }

    fn matching(&self, range: &NumericRange) -> Vec<Node> {
        if range.is_empty() {
            return Vec::new();
        }
        let lo = ordered_bits(range.min);
        let hi = ordered_bits(range.max);
        let mut nodes: Vec<Node> = self
            .postings(range.kind)
            .range(lo..=hi)
            .flat_map(|(_, nodes)| nodes.iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    fn matching_str(&self, range: &StringRange) -> Vec<Node> {
        if range.is_empty() {
            return Vec::new();
        }
        let lo = if range.min_incl {
            Bound::Included(range.min.as_str())
        } else {
            Bound::Excluded(range.min.as_str())
        };
        let hi = if range.max_incl {
            Bound::Included(range.max.as_str())
        } else {
            Bound::Excluded(range.max.as_str())
        };
        let mut nodes: Vec<Node> = self
            .string_postings(range.kind)
            .range::<str, _>((lo, hi))
            .flat_map(|(_, nodes)| nodes.iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

impl Data for MemData {
    fn lookup_cost(&self, range: &NumericRange) -> usize {
        self.matching(range).len()
    }

    fn iter<'a>(&'a self, range: &NumericRange) -> Box<dyn Iterator<Item = Node> + 'a> {
        Box::new(self.matching(range).into_iter())
    }

    fn string_lookup_cost(&self, range: &StringRange) -> usize {
        self.matching_str(range).len()
    }

    fn string_iter<'a>(&'a self, range: &StringRange) -> Box<dyn Iterator<Item = Node> + 'a> {
        Box::new(self.matching_str(range).into_iter())
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Maps an `f64` to a `u64` whose unsigned order matches numeric order.
fn ordered_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits & (1 << 63) == 0 {
        bits | (1 << 63)
    } else {
        !bits
    }
}
