//! Full-text union combinator.
//!
//! Combines the match streams of several full-text sub-expressions,
//! some possibly negated, into one stream ordered by document
//! position. At each step the subset of streams whose candidate shares
//! the minimum position is merged into a single result item carrying
//! the union of match positions and the aggregated relevance score.

use xylo_core::{Node, ScoredNode};

use crate::error::QueryResult;
use crate::eval::{QueryContext, Value};
use crate::expr::{Expr, SourcePos};
use crate::optimize::CompileContext;

/// One full-text match: a node, its token match positions, a negation
/// flag, and a relevance score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FtMatch {
    /// The matched node.
    pub node: Node,
    /// Token positions of the match inside the node's text.
    pub positions: Vec<u32>,
    /// Whether the match stems from a negated sub-expression.
    pub not: bool,
    /// Relevance score in `[0, 1]`.
    pub score: f64,
}

impl FtMatch {
    /// A positive match at `positions` with `score`.
    #[must_use]
    pub fn new(node: Node, positions: Vec<u32>, score: f64) -> Self {
        Self { node, positions, not: false, score: score.clamp(0.0, 1.0) }
    }

    /// A negated match carrying no positions.
    #[must_use]
    pub fn negated(node: Node) -> Self {
        Self { node, positions: Vec::new(), not: true, score: 0.0 }
    }
}

/// Union over full-text sub-expressions.
///
/// Each operand must evaluate to a match stream; operand streams are
/// normalized to document-position order before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct FtUnion {
    negated: bool,
    exprs: Vec<Expr>,
}

impl FtUnion {
    /// Creates a union over the sub-expressions `exprs`.
    ///
    /// `negated` marks a combinator constructed under an outer "not";
    /// it decides the flag of merged items that end up with zero match
    /// positions.
    #[must_use]
    pub fn new(negated: bool, exprs: Vec<Expr>) -> Self {
        Self { negated, exprs }
    }

    /// Whether the combinator was constructed negated.
    #[inline]
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The sub-expressions whose match streams are merged.
    #[inline]
    #[must_use]
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Evaluates every operand into a document-position sorted match
    /// stream.
    fn streams(&self, qc: &QueryContext) -> QueryResult<Vec<Vec<FtMatch>>> {
        let mut streams = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            qc.check_stop()?;
            let mut matches = expr.evaluate(qc)?.into_matches()?;
            matches.sort_by_key(|m| m.node.id);
            streams.push(matches);
        }
        Ok(streams)
    }

    /// Merges all operand streams into one stream ordered by document
    /// position.
    ///
    /// At each step the subset of streams whose current candidate has
    /// the minimum position is merged: positions are combined, the
    /// score is the maximum of the merged scores, and a merge of two
    /// partial matches clears an inherited negation flag since a
    /// positive match dominates. A merged item with zero positions is
    /// negated only when the whole combinator was constructed negated.
    pub fn matches(&self, qc: &QueryContext) -> QueryResult<Vec<FtMatch>> {
        let streams = self.streams(qc)?;
        let mut cursors: Vec<std::iter::Peekable<std::vec::IntoIter<FtMatch>>> =
            streams.into_iter().map(|s| s.into_iter().peekable()).collect();
        let mut out = Vec::new();
        loop {
            qc.check_stop()?;
            let min = cursors
                .iter_mut()
                .filter_map(|c| c.peek().map(|m| m.node.id))
                .min();
            let Some(min) = min else {
                break;
            };
            let mut item: Option<FtMatch> = None;
            for cursor in &mut cursors {
                let contributes = cursor.peek().map_or(false, |m| m.node.id == min);
                if !contributes {
                    continue;
                }
                let Some(next) = cursor.next() else {
                    continue;
                };
                item = Some(match item {
                    None => next,
                    Some(mut acc) => {
                        acc.positions.extend(next.positions);
                        acc.score = acc.score.max(next.score);
                        acc.not = false;
                        acc
                    }
                });
            }
            if let Some(mut item) = item {
                item.positions.sort_unstable();
                item.positions.dedup();
                if item.positions.is_empty() {
                    item.not = self.negated;
                }
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Merges and keeps only positive matches as scored nodes.
    pub fn scored_matches(&self, qc: &QueryContext) -> QueryResult<Vec<ScoredNode>> {
        Ok(self
            .matches(qc)?
            .into_iter()
            .filter(|m| !m.not)
            .map(|m| ScoredNode::new(m.node, m.score))
            .collect())
    }

    /// Evaluates to the merged match stream, so the combinator can
    /// feed an enclosing full-text expression directly.
    pub fn evaluate(&self, qc: &QueryContext) -> QueryResult<Value> {
        Ok(Value::Matches(self.matches(qc)?))
    }
}

impl std::fmt::Display for FtUnion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let neg = if self.negated { "not " } else { "" };
        write!(f, "{neg}ft:union(")?;
        for (i, expr) in self.exprs.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            write!(f, "{expr}")?;
        }
        write!(f, ")")
    }
}

/// Optimizes a full-text union: operands are optimized in place,
/// statically empty ones are dropped, and a combinator with no operand
/// left folds to the empty sequence.
pub(super) fn optimize(
    ft: FtUnion,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut exprs = Vec::with_capacity(ft.exprs.len());
    for expr in ft.exprs {
        let expr = expr.optimize(cc)?;
        if expr.is_empty_seq() {
            cc.record("ft:union: empty operand dropped");
            continue;
        }
        exprs.push(expr);
    }
    if exprs.is_empty() {
        cc.record("ft:union: no operands left");
        return Ok(Expr::empty().at(pos));
    }
    Ok(Expr::ft_union(FtUnion::new(ft.negated, exprs)).at(pos))
}
