//! # XyloDB Query
//!
//! The query-expression core of XyloDB: an algebraic expression tree,
//! a multi-pass optimizer with compile-time constant folding and
//! predicate merging, a cost-based index accessibility protocol,
//! document-order set operations, a full-text union combinator, and a
//! per-query evaluation context with cooperative cancellation.
//!
//! The caller supplies an already-built expression tree, optimizes it
//! once, and evaluates it under a [`QueryContext`]. Locking around
//! stored data belongs to the embedding command framework; this crate
//! only reads.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use xylo_core::{MemData, Node, NodeId, NodeKind, NodeSeq};
//! use xylo_query::{Expr, QueryContext, Value};
//!
//! let node = |id| Node::new(NodeId::new(id), NodeKind::Element);
//! let a = NodeSeq::from_nodes(vec![node(1), node(3), node(5)]);
//! let b = NodeSeq::from_nodes(vec![node(3), node(5), node(7)]);
//!
//! let expr = Expr::intersect(vec![Expr::nodes(a), Expr::nodes(b)]);
//! let qc = QueryContext::new(Arc::new(MemData::new()));
//! let Value::Nodes(result) = expr.evaluate(&qc).unwrap() else {
//!     unreachable!()
//! };
//! let ids: Vec<u64> = result.iter().map(|n| n.id.as_u64()).collect();
//! assert_eq!(ids, vec![3, 5]);
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

mod error;
mod eval;
mod expr;
mod optimize;

pub use error::{QueryError, QueryResult};
pub use eval::{CancellationToken, Focus, QueryContext, Value};
pub use expr::{
    Expr, ExprKind, FtMatch, FtUnion, IndexInfo, ItemKind, NumRange, Occ, PosRange, RangeAccess,
    SeqType, SourcePos, StrRange, StringRangeAccess,
};
pub use optimize::{CompileContext, Optimizer};

use std::sync::Arc;

use xylo_core::Data;

/// Optimizes an expression tree against `data` until fixpoint.
pub fn optimize(expr: Expr, data: Arc<dyn Data>) -> QueryResult<Expr> {
    let mut cc = CompileContext::new(data);
    Optimizer::new().optimize(expr, &mut cc)
}

/// Evaluates an expression under a populated query context.
///
/// The caller is expected to hold the lock mode its top-level command
/// requires before calling in.
pub fn evaluate(expr: &Expr, qc: &QueryContext) -> QueryResult<Value> {
    expr.evaluate(qc)
}
