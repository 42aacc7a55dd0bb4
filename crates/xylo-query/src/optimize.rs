//! The multi-pass optimizer driver.
//!
//! One pass walks the tree bottom-up and applies every variant
//! rewrite once; the driver repeats passes until the tree stops
//! changing or the pass budget is spent. Individual rewrites are
//! idempotent, so a fixpoint is normally reached within a pass or
//! two.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use xylo_core::MemData;
//! use xylo_query::{CompileContext, Expr, Optimizer, PosRange};
//!
//! let mut cc = CompileContext::new(Arc::new(MemData::new()));
//! let expr = Expr::and(vec![
//!     Expr::pos(PosRange::exact(2)),
//!     Expr::pos(PosRange::exact(3)),
//! ]);
//! let optimized = Optimizer::new().optimize(expr, &mut cc).unwrap();
//! assert!(optimized.is_false());
//! ```

use std::sync::Arc;

use xylo_core::Data;

use crate::error::QueryResult;
use crate::expr::Expr;

/// Compile-time state threaded through every `optimize` call.
pub struct CompileContext {
    data: Arc<dyn Data>,
    rewrites: usize,
}

impl CompileContext {
    /// Creates a compile context over `data`.
    #[must_use]
    pub fn new(data: Arc<dyn Data>) -> Self {
        Self { data, rewrites: 0 }
    }

    /// The storage handle index cost estimates are taken from.
    #[must_use]
    pub fn data(&self) -> &Arc<dyn Data> {
        &self.data
    }

    /// Number of rewrites applied so far.
    #[inline]
    #[must_use]
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }

    /// Records an applied rewrite.
    pub(crate) fn record(&mut self, rule: &str) {
        self.rewrites += 1;
        tracing::debug!(rule, "applied rewrite");
    }
}

impl std::fmt::Debug for CompileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileContext").field("rewrites", &self.rewrites).finish()
    }
}

/// Repeats optimization passes until fixpoint.
#[derive(Debug, Clone, Copy)]
pub struct Optimizer {
    max_passes: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self { max_passes: 10 }
    }
}

impl Optimizer {
    /// Creates an optimizer with the default pass budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of passes.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Optimizes `expr` until the tree stops changing or the pass
    /// budget is spent.
    pub fn optimize(&self, expr: Expr, cc: &mut CompileContext) -> QueryResult<Expr> {
        let mut current = expr;
        for pass in 0..self.max_passes {
            let next = current.clone().optimize(cc)?;
            if next == current {
                return Ok(current);
            }
            tracing::debug!(pass, "optimizer pass changed the tree");
            current = next;
        }
        Ok(current)
    }
}
