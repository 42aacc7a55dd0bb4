//! Logical combinator rewrites and evaluation.
//!
//! Conjunction optimization applies, left to right over operands:
//! adjacent positional merging, adjacent numeric and string range
//! merging, constant folding with optimize-time short-circuit,
//! emptiness folding, a De Morgan rewrite when every operand is a
//! negation, and arity collapse. Disjunction is the documented dual.

use crate::error::QueryResult;
use crate::eval::{QueryContext, Value};
use crate::expr::{Expr, ExprKind, IndexInfo, SourcePos};
use crate::optimize::CompileContext;

/// Optimizes a conjunction.
pub(super) fn optimize_and(
    exprs: Vec<Expr>,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut out: Vec<Expr> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = expr.optimize(cc)?;
        // A statically false operand collapses the whole conjunction;
        // the remaining operands are never rewritten.
        if expr.is_false() {
            cc.record("and: operand is false()");
            return Ok(Expr::boolean(false).at(pos));
        }
        if expr.is_true() {
            cc.record("and: dropped true() operand");
            continue;
        }
        if !merge_adjacent(&mut out, expr, cc)? {
            return Ok(Expr::boolean(false).at(pos));
        }
    }

    if out.is_empty() {
        cc.record("and: no operands left");
        return Ok(Expr::boolean(true).at(pos));
    }

    if out.iter().all(|e| matches!(e.kind, ExprKind::Not(_))) {
        cc.record("and: De Morgan");
        let inners = out
            .into_iter()
            .map(|e| match e.kind {
                ExprKind::Not(inner) => *inner,
                _ => e,
            })
            .collect();
        return Expr::not(Expr::or(inners).at(pos)).at(pos).optimize(cc);
    }

    let rewritten = index_rewrite(Expr::and(out).at(pos), cc)?;
    match rewritten.kind {
        ExprKind::And(mut out) => {
            if out.len() == 1 && out[0].is_boolean() {
                cc.record("and: single operand");
                return Ok(out.remove(0));
            }
            Ok(Expr::and(out).at(pos))
        }
        kind => Ok(Expr::new(kind).at(pos)),
    }
}

/// Merges `expr` into the tail of `out` when it is a positional or
/// range predicate adjacent to one of the same shape.
///
/// Returns `false` when a positional merge proved the conjunction
/// statically false.
fn merge_adjacent(out: &mut Vec<Expr>, expr: Expr, cc: &mut CompileContext) -> QueryResult<bool> {
    enum Merge {
        Replace(ExprKind),
        Keep,
        False,
    }

    let merge = match (out.last().map(|e| &e.kind), &expr.kind) {
        (Some(ExprKind::Pos(prev)), ExprKind::Pos(next)) => {
            // Positional intersection always merges; a disjoint pair
            // degrades to the false constant.
            let merged = prev.intersect(next);
            if merged.is_empty() {
                Merge::False
            } else {
                cc.record("and: merged positions");
                Merge::Replace(ExprKind::Pos(merged))
            }
        }
        (Some(ExprKind::CmpNum(prev)), ExprKind::CmpNum(next)) => match prev.intersect(next) {
            Some(merged) => {
                cc.record("and: merged numeric ranges");
                Merge::Replace(ExprKind::CmpNum(merged))
            }
            // Disjoint ranges stay as two predicates.
            None => Merge::Keep,
        },
        (Some(ExprKind::CmpStr(prev)), ExprKind::CmpStr(next)) => match prev.intersect(next) {
            Some(merged) => {
                cc.record("and: merged string ranges");
                Merge::Replace(ExprKind::CmpStr(merged))
            }
            None => Merge::Keep,
        },
        _ => Merge::Keep,
    };

    match merge {
        Merge::False => {
            cc.record("and: disjoint positions");
            Ok(false)
        }
        Merge::Replace(kind) => {
            if let Some(last) = out.last_mut() {
                last.kind = kind;
            }
            Ok(true)
        }
        Merge::Keep => {
            out.push(expr);
            Ok(true)
        }
    }
}

/// Consults the index accessibility protocol for an optimized
/// conjunction and applies the cheaper rewrite when every operand is
/// accessible.
fn index_rewrite(expr: Expr, cc: &mut CompileContext) -> QueryResult<Expr> {
    let mut ii = IndexInfo::new(cc.data().clone());
    if !expr.index_accessible(&mut ii)? {
        return Ok(expr);
    }
    if ii.costs == 0 {
        cc.record("and: index lookup is provably empty");
        return Ok(Expr::empty().at(expr.pos));
    }
    match ii.replacement.take() {
        Some(replacement) => {
            cc.record("and: rewritten to index intersection");
            Ok(replacement.at(expr.pos))
        }
        None => Ok(expr),
    }
}

/// Optimizes a disjunction, the dual of the conjunction rewrite: a
/// statically true operand annihilates, false operands are dropped,
/// zero operands fold to false, an all-negation operand list becomes
/// a negated conjunction, and a single boolean operand replaces the
/// disjunction.
pub(super) fn optimize_or(
    exprs: Vec<Expr>,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let mut out: Vec<Expr> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = expr.optimize(cc)?;
        if expr.is_true() {
            cc.record("or: operand is true()");
            return Ok(Expr::boolean(true).at(pos));
        }
        if expr.is_false() {
            cc.record("or: dropped false() operand");
            continue;
        }
        out.push(expr);
    }

    if out.is_empty() {
        cc.record("or: no operands left");
        return Ok(Expr::boolean(false).at(pos));
    }

    if out.iter().all(|e| matches!(e.kind, ExprKind::Not(_))) {
        cc.record("or: De Morgan");
        let inners = out
            .into_iter()
            .map(|e| match e.kind {
                ExprKind::Not(inner) => *inner,
                _ => e,
            })
            .collect();
        return Expr::not(Expr::and(inners).at(pos)).at(pos).optimize(cc);
    }

    if out.len() == 1 && out[0].is_boolean() {
        cc.record("or: single operand");
        return Ok(out.remove(0));
    }

    Ok(Expr::or(out).at(pos))
}

/// Optimizes a negation: constants fold and a boolean-typed double
/// negation is eliminated.
pub(super) fn optimize_not(
    expr: Expr,
    pos: SourcePos,
    cc: &mut CompileContext,
) -> QueryResult<Expr> {
    let expr = expr.optimize(cc)?;
    match expr.kind {
        ExprKind::Bool(value) => {
            cc.record("not: folded constant");
            Ok(Expr::boolean(!value).at(pos))
        }
        ExprKind::Not(inner) if inner.is_boolean() => {
            cc.record("not: eliminated double negation");
            Ok(*inner)
        }
        kind => Ok(Expr::new(kind).at(pos)),
    }
}

/// Evaluates a conjunction left to right, short-circuiting on the
/// first false operand.
///
/// With scoring enabled and every operand true, the score is the sum
/// of the operand scores averaged over all operands; an unscored
/// operand contributes zero. A false result is unscored.
#[allow(clippy::cast_precision_loss)]
pub(super) fn eval_and(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    let mut sum = 0.0;
    for expr in exprs {
        let value = expr.evaluate(qc)?;
        if !value.ebv()? {
            return Ok(Value::bool(false));
        }
        sum += value.score().unwrap_or(0.0);
    }
    let score = if qc.scoring() && !exprs.is_empty() {
        Some(sum / exprs.len() as f64)
    } else {
        None
    };
    Ok(Value::Bool { value: true, score })
}

/// Evaluates a disjunction left to right, short-circuiting on the
/// first true operand. A scored disjunction keeps the score of the
/// operand that succeeded.
pub(super) fn eval_or(exprs: &[Expr], qc: &QueryContext) -> QueryResult<Value> {
    for expr in exprs {
        let value = expr.evaluate(qc)?;
        if value.ebv()? {
            let score = if qc.scoring() { value.score() } else { None };
            return Ok(Value::Bool { value: true, score });
        }
    }
    Ok(Value::bool(false))
}

/// Evaluates a negation of the operand's effective boolean value,
/// dropping any score.
pub(super) fn eval_not(expr: &Expr, qc: &QueryContext) -> QueryResult<Value> {
    let value = expr.evaluate(qc)?;
    Ok(Value::bool(!value.ebv()?))
}
