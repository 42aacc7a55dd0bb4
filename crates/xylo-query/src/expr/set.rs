//! Set operations over node-producing operands.
//!
//! Every operation yields a document-order sorted, duplicate-free
//! sequence. Evaluation picks between a bulk algorithm that
//! materializes operands and a streaming merge-join used when every
//! operand is already guaranteed to yield a sorted, duplicate-free
//! sequence. Cancellation is polled at every loop iteration.

use std::collections::HashSet;

use xylo_core::{Node, NodeId, NodeSeq};

use crate::error::QueryResult;
use crate::eval::{QueryContext, Value};
use crate::expr::{Expr, ExprKind, SourcePos};
use crate::optimize::CompileContext;

/// Optimizes an intersection: any statically empty operand makes the
/// whole result empty without rewriting the remaining operands.
pub(super) fn optimize_intersect(
    exprs: Vec<Expr>,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = expr.optimize(cc)?;
        if expr.is_empty_seq() {
            cc.record("intersect: empty operand");
            return Ok(Expr::empty().at(pos));
        }
        out.push(expr);
    }
    if out.is_empty() {
        return Ok(Expr::empty().at(pos));
    }
    Ok(Expr::intersect(out).at(pos))
}

/// Optimizes a union: statically empty operands are dropped; all empty
/// folds to the empty sequence.
pub(super) fn optimize_union(
    exprs: Vec<Expr>,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = expr.optimize(cc)?;
        if expr.is_empty_seq() {
            cc.record("union: dropped empty operand");
            continue;
        }
        out.push(expr);
    }
    if out.is_empty() {
        return Ok(Expr::empty().at(pos));
    }
    Ok(Expr::union(out).at(pos))
}

/// Optimizes a difference: an empty first operand folds the whole
/// expression; empty tail operands are dropped.
pub(super) fn optimize_except(
    exprs: Vec<Expr>,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut iter = exprs.into_iter();
    let first = match iter.next() {
        Some(first) => first.optimize(cc)?,
        None => return Ok(Expr::empty().at(pos)),
    };
    if first.is_empty_seq() {
        cc.record("except: empty first operand");
        return Ok(Expr::empty().at(pos));
    }
    let mut out = vec![first];
    for expr in iter {
        let expr = expr.optimize(cc)?;
        if expr.is_empty_seq() {
            cc.record("except: dropped empty operand");
            continue;
        }
        out.push(expr);
    }
    Ok(Expr::except(out).at(pos))
}

/// Returns `true` when an operand is guaranteed to yield a sorted,
/// duplicate-free sequence without materialization tricks.
fn yields_sorted(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Nodes(_) | ExprKind::Empty)
}

/// Evaluates an intersection of `exprs`.
pub(super) fn eval_intersect(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    if exprs.is_empty() {
        return Ok(Value::Empty);
    }
    if exprs.iter().all(yields_sorted) {
        let cursors = materialize_all(exprs, qc)?;
        let mut iter = IntersectIter::new(cursors);
        let mut out = NodeSeq::new();
        while let Some(node) = iter.next(qc)? {
            out.push_unchecked(node);
        }
        return Ok(Value::Nodes(out));
    }
    bulk_intersect(exprs, qc)
}

/// Bulk intersection: materializes the first operand, then filters it
/// through each remaining operand's identities, stopping early when
/// the running result empties.
fn bulk_intersect(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    let mut current = exprs[0].evaluate(qc)?.into_nodes()?;
    for expr in &exprs[1..] {
        qc.check_stop()?;
        if current.is_empty() {
            return Ok(Value::Nodes(current));
        }
        let ids: HashSet<NodeId> = current.iter().map(|n| n.id).collect();
        let nodes = expr.evaluate(qc)?.into_nodes()?;
        let mut kept = Vec::new();
        for node in nodes {
            qc.check_stop()?;
            if ids.contains(&node.id) {
                kept.push(node);
            }
        }
        current = NodeSeq::from_nodes(kept);
    }
    Ok(Value::Nodes(current))
}

/// Evaluates a union of `exprs`.
pub(super) fn eval_union(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    if exprs.is_empty() {
        return Ok(Value::Empty);
    }
    if exprs.iter().all(yields_sorted) {
        let cursors = materialize_all(exprs, qc)?;
        let mut iter = UnionIter::new(cursors);
        let mut out = NodeSeq::new();
        while let Some(node) = iter.next(qc)? {
            out.push_unchecked(node);
        }
        return Ok(Value::Nodes(out));
    }
    let mut all = Vec::new();
    for expr in exprs {
        for node in expr.evaluate(qc)?.into_nodes()? {
            qc.check_stop()?;
            all.push(node);
        }
    }
    Ok(Value::Nodes(NodeSeq::from_nodes(all)))
}

/// Evaluates a difference: the first operand minus the identities of
/// all remaining operands.
pub(super) fn eval_except(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    if exprs.is_empty() {
        return Ok(Value::Empty);
    }
    let first = exprs[0].evaluate(qc)?.into_nodes()?;
    if first.is_empty() {
        return Ok(Value::Nodes(first));
    }
    let mut excluded: HashSet<NodeId> = HashSet::new();
    for expr in &exprs[1..] {
        qc.check_stop()?;
        for node in expr.evaluate(qc)?.into_nodes()? {
            qc.check_stop()?;
            excluded.insert(node.id);
        }
    }
    let kept = first.into_iter().filter(|n| !excluded.contains(&n.id)).collect();
    Ok(Value::Nodes(kept))
}

fn materialize_all(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Vec<NodeSeq>> {
    exprs.iter().map(|e| e.evaluate(qc).and_then(Value::into_nodes)).collect()
}

/// Sorted merge-join over one cursor per operand.
///
/// Compares the lead of cursor 0 against cursor `i`: ahead advances
/// `i`, behind advances cursor 0 and restarts the sweep, equal moves
/// on to the next operand. A match across all cursors yields the node
/// and advances every cursor. Terminates when any cursor exhausts.
struct IntersectIter {
    iters: Vec<std::vec::IntoIter<Node>>,
    heads: Vec<Option<Node>>,
}

impl IntersectIter {
    fn new(seqs: Vec<NodeSeq>) -> Self {
        let mut iters: Vec<_> = seqs.into_iter().map(|s| s.into_vec().into_iter()).collect();
        let heads = iters.iter_mut().map(Iterator::next).collect();
        Self { iters, heads }
    }

    fn next(&mut self, qc: &QueryContext) -> QueryResult<Option<Node>> {
        let mut i = 1;
        while i < self.heads.len() {
            qc.check_stop()?;
            let (lead, other) = match (self.heads[0], self.heads[i]) {
                (Some(lead), Some(other)) => (lead, other),
                _ => return Ok(None),
            };
            let diff = lead.diff(&other);
            if diff > 0 {
                self.heads[i] = self.iters[i].next();
            } else if diff < 0 {
                self.heads[0] = self.iters[0].next();
                i = 1;
            } else {
                i += 1;
            }
        }
        qc.check_stop()?;
        let matched = self.heads[0];
        if matched.is_none() {
            return Ok(None);
        }
        for (head, iter) in self.heads.iter_mut().zip(&mut self.iters) {
            *head = iter.next();
        }
        Ok(matched)
    }
}

/// K-way minimum merge that skips duplicate identities.
struct UnionIter {
    iters: Vec<std::vec::IntoIter<Node>>,
    heads: Vec<Option<Node>>,
}

impl UnionIter {
    fn new(seqs: Vec<NodeSeq>) -> Self {
        let mut iters: Vec<_> = seqs.into_iter().map(|s| s.into_vec().into_iter()).collect();
        let heads = iters.iter_mut().map(Iterator::next).collect();
        Self { iters, heads }
    }

    fn next(&mut self, qc: &QueryContext) -> QueryResult<Option<Node>> {
        qc.check_stop()?;
        let min = self.heads.iter().flatten().copied().min();
        let Some(min) = min else {
            return Ok(None);
        };
        for (head, iter) in self.heads.iter_mut().zip(&mut self.iters) {
            while head.map_or(false, |n| n.id == min.id) {
                *head = iter.next();
            }
        }
        Ok(Some(min))
    }
}
