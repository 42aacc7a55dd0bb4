//! Index accessibility protocol and the range accessor leaf.
//!
//! During optimization any expression may declare that it can be
//! answered by a direct index lookup. The protocol result carries an
//! estimated cardinality and a replacement accessor expression; a cost
//! of `0` is the reserved sentinel for a provably empty lookup.

use std::sync::Arc;

use xylo_core::{Data, Node, NodeSeq, NumericRange, StringRange};

use crate::error::QueryResult;
use crate::eval::QueryContext;
use crate::expr::Expr;

/// Result descriptor of an index accessibility probe.
pub struct IndexInfo {
    data: Arc<dyn Data>,
    /// Estimated result cardinality; `0` means provably empty and
    /// tells the caller to stop probing sibling operands.
    pub costs: usize,
    /// The accessor expression that would replace the probed one.
    pub replacement: Option<Expr>,
}

impl IndexInfo {
    /// Creates a probe descriptor against `data`.
    #[must_use]
    pub fn new(data: Arc<dyn Data>) -> Self {
        Self { data, costs: 0, replacement: None }
    }

    /// The storage handle cost estimates are taken from.
    #[must_use]
    pub fn data(&self) -> &Arc<dyn Data> {
        &self.data
    }
}

impl std::fmt::Debug for IndexInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexInfo")
            .field("costs", &self.costs)
            .field("replacement", &self.replacement)
            .finish()
    }
}

/// Probes a range comparison: accessible when it carries an index
/// candidate, at the cost the index reports for its token.
pub(super) fn cmp_accessible(token: Option<NumericRange>, ii: &mut IndexInfo) -> QueryResult<bool> {
    let Some(token) = token else {
        return Ok(false);
    };
    let costs = ii.data.lookup_cost(&token);
    tracing::trace!(%token, costs, "index cost estimate");
    ii.costs = costs;
    ii.replacement = Some(Expr::range_access(RangeAccess::new(token)));
    Ok(true)
}

/// Probes a string range comparison, mirroring the numeric case
/// against the string value index.
pub(super) fn str_accessible(token: Option<StringRange>, ii: &mut IndexInfo) -> QueryResult<bool> {
    let Some(token) = token else {
        return Ok(false);
    };
    let costs = ii.data.string_lookup_cost(&token);
    tracing::trace!(%token, costs, "index cost estimate");
    ii.costs = costs;
    ii.replacement = Some(Expr::string_access(StringRangeAccess::new(token)));
    Ok(true)
}

/// Probes a conjunction: the decision is conjunction-level.
///
/// Every operand is queried; one inaccessible operand aborts the whole
/// rewrite. Otherwise operands are reordered by ascending cost, the
/// replacement is an intersection over the per-operand accessors, and
/// the reported cost is the maximum operand cost, the pessimistic
/// bound for an intersection driven by its least selective source.
pub(super) fn and_accessible(exprs: &[Expr], ii: &mut IndexInfo) -> QueryResult<bool> {
    let mut entries: Vec<(usize, Expr)> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let mut probe = IndexInfo::new(ii.data.clone());
        if !expr.index_accessible(&mut probe)? {
            return Ok(false);
        }
        if probe.costs == 0 {
            // Provably empty operand: stop probing siblings.
            ii.costs = 0;
            ii.replacement = None;
            return Ok(true);
        }
        let Some(replacement) = probe.replacement else {
            return Ok(false);
        };
        entries.push((probe.costs, replacement));
    }
    if entries.is_empty() {
        return Ok(false);
    }
    // Stable sort keeps written order among equal costs.
    entries.sort_by_key(|(costs, _)| *costs);
    ii.costs = entries.iter().map(|(costs, _)| *costs).max().unwrap_or(0);
    ii.replacement = Some(Expr::intersect(entries.into_iter().map(|(_, e)| e).collect()));
    Ok(true)
}

/// A leaf expression streaming nodes directly from a value index.
///
/// The token is immutable after construction; equality is structural.
/// Iteration order is the index's native order, so callers needing
/// document order materialize through [`RangeAccess::materialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RangeAccess {
    token: NumericRange,
}

impl RangeAccess {
    /// Creates an accessor for `token`.
    #[inline]
    #[must_use]
    pub fn new(token: NumericRange) -> Self {
        Self { token }
    }

    /// The immutable index token this accessor scans.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &NumericRange {
        &self.token
    }

    /// Streams nodes in the index's native iteration order, which is
    /// not necessarily document order.
    pub fn iter<'a>(&self, qc: &'a QueryContext) -> Box<dyn Iterator<Item = Node> + 'a> {
        qc.data().iter(&self.token)
    }

    /// Materializes the full, document-order sorted, duplicate-free
    /// sequence, polling cancellation at every node.
    pub fn materialize(&self, qc: &QueryContext) -> QueryResult<NodeSeq> {
        let mut nodes = Vec::new();
        for node in qc.data().iter(&self.token) {
            qc.check_stop()?;
            nodes.push(node);
        }
        Ok(NodeSeq::from_nodes(nodes))
    }
}

impl std::fmt::Display for RangeAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "db:{}-range({}, {})", self.token.kind, self.token.min, self.token.max)
    }
}

/// A leaf expression streaming nodes directly from a string value
/// index, the lexicographic sibling of [`RangeAccess`].
#[derive(Debug, Clone, PartialEq)]
pub struct StringRangeAccess {
    token: StringRange,
}

impl StringRangeAccess {
    /// Creates an accessor for `token`.
    #[inline]
    #[must_use]
    pub fn new(token: StringRange) -> Self {
        Self { token }
    }

    /// The immutable index token this accessor scans.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &StringRange {
        &self.token
    }

    /// Streams nodes in the index's native iteration order, which is
    /// not necessarily document order.
    pub fn iter<'a>(&self, qc: &'a QueryContext) -> Box<dyn Iterator<Item = Node> + 'a> {
        qc.data().string_iter(&self.token)
    }

    /// Materializes the full, document-order sorted, duplicate-free
    /// sequence, polling cancellation at every node.
    pub fn materialize(&self, qc: &QueryContext) -> QueryResult<NodeSeq> {
        let mut nodes = Vec::new();
        for node in qc.data().string_iter(&self.token) {
            qc.check_stop()?;
            nodes.push(node);
        }
        Ok(NodeSeq::from_nodes(nodes))
    }
}

impl std::fmt::Display for StringRangeAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "db:{}-string-range({}, {})", self.token.kind, self.token.min, self.token.max)
    }
}
