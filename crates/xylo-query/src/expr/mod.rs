//! The query expression tree.
//!
//! Every operator, literal, and accessor is a variant of [`ExprKind`],
//! dispatched exhaustively by `optimize`, `evaluate`, and the index
//! accessibility protocol. Trees are acyclic and exclusively owned;
//! rewrites build new nodes instead of mutating shared state.
//!
//! # Example
//!
//! ```
//! use xylo_query::{Expr, PosRange};
//!
//! let expr = Expr::and(vec![
//!     Expr::pos(PosRange::exact(2)),
//!     Expr::pos(PosRange::exact(2)),
//! ]);
//! assert_eq!(expr.to_string(), "(position() = 2 and position() = 2)");
//! ```

mod cmp;
mod ft;
mod index;
mod logical;
mod set;

pub use cmp::{NumRange, PosRange, StrRange};
pub use ft::{FtMatch, FtUnion};
pub use index::{IndexInfo, RangeAccess, StringRangeAccess};

use xylo_core::NodeSeq;

use crate::error::QueryResult;
use crate::eval::{QueryContext, Value};
use crate::optimize::CompileContext;

/// Source position metadata carried by every expression for
/// diagnostics. No parent back-references are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePos {
    /// 1-based source line, 0 when unknown.
    pub line: u32,
    /// 1-based source column, 0 when unknown.
    pub col: u32,
}

impl SourcePos {
    /// Creates a source position.
    #[inline]
    #[must_use]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Result cardinality of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occ {
    /// The empty sequence.
    Zero,
    /// At most one item.
    ZeroOrOne,
    /// Exactly one item.
    One,
    /// Any number of items.
    ZeroOrMore,
}

/// Item kind of an expression's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A boolean value.
    Boolean,
    /// A structural node.
    Node,
    /// Any item.
    Item,
}

/// Static result type descriptor: cardinality plus item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqType {
    /// Result cardinality.
    pub occ: Occ,
    /// Result item kind.
    pub item: ItemKind,
}

impl SeqType {
    /// Exactly one boolean.
    pub const BOOLEAN: Self = Self { occ: Occ::One, item: ItemKind::Boolean };
    /// The empty sequence.
    pub const EMPTY: Self = Self { occ: Occ::Zero, item: ItemKind::Item };
    /// Zero or more nodes.
    pub const NODES: Self = Self { occ: Occ::ZeroOrMore, item: ItemKind::Node };
    /// Zero or more items.
    pub const ITEMS: Self = Self { occ: Occ::ZeroOrMore, item: ItemKind::Item };
}

/// The closed set of expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Boolean constant.
    Bool(bool),
    /// Statically empty sequence.
    Empty,
    /// Literal node sequence.
    Nodes(NodeSeq),
    /// Variable reference resolved against context bindings.
    Var(String),
    /// Logical conjunction.
    And(Vec<Expr>),
    /// Logical disjunction.
    Or(Vec<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// Positional predicate.
    Pos(PosRange),
    /// Numeric range comparison over the focused value.
    CmpNum(NumRange),
    /// Lexicographic string range comparison over the focused value.
    CmpStr(StrRange),
    /// Document-order intersection of node-producing operands.
    Intersect(Vec<Expr>),
    /// Document-order union of node-producing operands.
    Union(Vec<Expr>),
    /// First operand minus all following operands.
    Except(Vec<Expr>),
    /// Index accessor leaf streaming nodes from a numeric value index.
    RangeAccess(RangeAccess),
    /// Index accessor leaf streaming nodes from a string value index.
    StringAccess(StringRangeAccess),
    /// Literal full-text match stream.
    FtMatches(Vec<FtMatch>),
    /// Full-text union combinator.
    FtUnion(FtUnion),
}

/// One node of the query's algebraic representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// The variant and its fields.
    pub kind: ExprKind,
    /// Source position for diagnostics.
    pub pos: SourcePos,
}

impl Expr {
    /// Wraps a variant with an unknown source position.
    #[inline]
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        Self { kind, pos: SourcePos::default() }
    }

    /// Attaches a source position.
    #[inline]
    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = pos;
        self
    }

    /// Boolean constant.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::new(ExprKind::Bool(value))
    }

    /// The statically empty sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ExprKind::Empty)
    }

    /// Literal node sequence.
    #[must_use]
    pub fn nodes(seq: NodeSeq) -> Self {
        Self::new(ExprKind::Nodes(seq))
    }

    /// Variable reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Var(name.into()))
    }

    /// Logical conjunction over `exprs`.
    #[must_use]
    pub fn and(exprs: Vec<Self>) -> Self {
        Self::new(ExprKind::And(exprs))
    }

    /// Logical disjunction over `exprs`.
    #[must_use]
    pub fn or(exprs: Vec<Self>) -> Self {
        Self::new(ExprKind::Or(exprs))
    }

    /// Logical negation of `expr`.
    #[must_use]
    pub fn not(expr: Self) -> Self {
        Self::new(ExprKind::Not(Box::new(expr)))
    }

    /// Positional predicate.
    #[must_use]
    pub fn pos(range: PosRange) -> Self {
        Self::new(ExprKind::Pos(range))
    }

    /// Numeric range comparison.
    #[must_use]
    pub fn cmp_num(range: NumRange) -> Self {
        Self::new(ExprKind::CmpNum(range))
    }

    /// String range comparison.
    #[must_use]
    pub fn cmp_str(range: StrRange) -> Self {
        Self::new(ExprKind::CmpStr(range))
    }

    /// Intersection over `exprs`.
    #[must_use]
    pub fn intersect(exprs: Vec<Self>) -> Self {
        Self::new(ExprKind::Intersect(exprs))
    }

    /// Union over `exprs`.
    #[must_use]
    pub fn union(exprs: Vec<Self>) -> Self {
        Self::new(ExprKind::Union(exprs))
    }

    /// Difference of the first operand and the rest.
    #[must_use]
    pub fn except(exprs: Vec<Self>) -> Self {
        Self::new(ExprKind::Except(exprs))
    }

    /// Numeric index accessor leaf.
    #[must_use]
    pub fn range_access(access: RangeAccess) -> Self {
        Self::new(ExprKind::RangeAccess(access))
    }

    /// String index accessor leaf.
    #[must_use]
    pub fn string_access(access: StringRangeAccess) -> Self {
        Self::new(ExprKind::StringAccess(access))
    }

    /// Literal full-text match stream.
    #[must_use]
    pub fn ft_matches(matches: Vec<FtMatch>) -> Self {
        Self::new(ExprKind::FtMatches(matches))
    }

    /// Full-text union combinator.
    #[must_use]
    pub fn ft_union(ft: FtUnion) -> Self {
        Self::new(ExprKind::FtUnion(ft))
    }

    /// Static result type of this expression.
    #[must_use]
    pub fn seq_type(&self) -> SeqType {
        match &self.kind {
            ExprKind::Bool(_)
            | ExprKind::And(_)
            | ExprKind::Or(_)
            | ExprKind::Not(_)
            | ExprKind::Pos(_)
            | ExprKind::CmpNum(_)
            | ExprKind::CmpStr(_) => SeqType::BOOLEAN,
            ExprKind::Empty => SeqType::EMPTY,
            ExprKind::Nodes(seq) => match seq.len() {
                0 => SeqType::EMPTY,
                1 => SeqType { occ: Occ::One, item: ItemKind::Node },
                _ => SeqType::NODES,
            },
            ExprKind::Var(_) => SeqType::ITEMS,
            ExprKind::Intersect(_)
            | ExprKind::Union(_)
            | ExprKind::Except(_)
            | ExprKind::RangeAccess(_)
            | ExprKind::StringAccess(_)
            | ExprKind::FtMatches(_)
            | ExprKind::FtUnion(_) => SeqType::NODES,
        }
    }

    /// Returns `true` if this is the statically false constant.
    #[inline]
    #[must_use]
    pub fn is_false(&self) -> bool {
        matches!(self.kind, ExprKind::Bool(false))
    }

    /// Returns `true` if this is the statically true constant.
    #[inline]
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self.kind, ExprKind::Bool(true))
    }

    /// Returns `true` if this expression is statically the empty
    /// sequence.
    #[must_use]
    pub fn is_empty_seq(&self) -> bool {
        match &self.kind {
            ExprKind::Empty => true,
            ExprKind::Nodes(seq) => seq.is_empty(),
            ExprKind::FtMatches(matches) => matches.is_empty(),
            _ => false,
        }
    }

    /// Returns `true` if this expression statically yields a boolean.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.seq_type().item == ItemKind::Boolean
    }

    /// Deep copy with freshly owned sub-trees.
    ///
    /// Variable bindings live in the context keyed by name, so the
    /// structural clone is already a fresh identity.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Optimizes this expression bottom-up.
    ///
    /// Children are optimized first, then variant rewrites apply. The
    /// result is idempotent: optimizing the output again yields an
    /// equal tree. Returning a constant short-circuits parent rewrites.
    pub fn optimize(self, cc: &mut CompileContext) -> QueryResult<Self> {
        let pos = self.pos;
        let expr = match self.kind {
            ExprKind::And(exprs) => logical::optimize_and(exprs, pos, cc)?,
            ExprKind::Or(exprs) => logical::optimize_or(exprs, pos, cc)?,
            ExprKind::Not(expr) => logical::optimize_not(*expr, pos, cc)?,
            ExprKind::Intersect(exprs) => set::optimize_intersect(exprs, pos, cc)?,
            ExprKind::Union(exprs) => set::optimize_union(exprs, pos, cc)?,
            ExprKind::Except(exprs) => set::optimize_except(exprs, pos, cc)?,
            ExprKind::FtUnion(ft) => ft::optimize(ft, pos, cc)?,
            kind @ (ExprKind::Bool(_)
            | ExprKind::Empty
            | ExprKind::Nodes(_)
            | ExprKind::Var(_)
            | ExprKind::Pos(_)
            | ExprKind::CmpNum(_)
            | ExprKind::CmpStr(_)
            | ExprKind::RangeAccess(_)
            | ExprKind::StringAccess(_)
            | ExprKind::FtMatches(_)) => Self { kind, pos },
        };
        Ok(expr)
    }

    /// Evaluates this expression against a query context.
    pub fn evaluate(&self, qc: &QueryContext) -> QueryResult<Value> {
        match &self.kind {
            ExprKind::Bool(value) => Ok(Value::bool(*value)),
            ExprKind::Empty => Ok(Value::Empty),
            ExprKind::Nodes(seq) => Ok(Value::Nodes(seq.clone())),
            ExprKind::Var(name) => qc.binding(name).cloned(),
            ExprKind::And(exprs) => logical::eval_and(exprs, qc),
            ExprKind::Or(exprs) => logical::eval_or(exprs, qc),
            ExprKind::Not(expr) => logical::eval_not(expr, qc),
            ExprKind::Pos(range) => Ok(Value::bool(range.matches(qc.focus()?.position))),
            ExprKind::CmpNum(range) => {
                let matched = qc.focus()?.number.map_or(false, |n| range.matches(n));
                Ok(Value::bool(matched))
            }
            ExprKind::CmpStr(range) => {
                let matched = qc.focus()?.string.as_deref().map_or(false, |s| range.matches(s));
                Ok(Value::bool(matched))
            }
            ExprKind::Intersect(exprs) => set::eval_intersect(exprs, qc),
            ExprKind::Union(exprs) => set::eval_union(exprs, qc),
            ExprKind::Except(exprs) => set::eval_except(exprs, qc),
            ExprKind::RangeAccess(access) => Ok(Value::Nodes(access.materialize(qc)?)),
            ExprKind::StringAccess(access) => Ok(Value::Nodes(access.materialize(qc)?)),
            ExprKind::FtMatches(matches) => {
                let mut matches = matches.clone();
                matches.sort_by_key(|m| m.node.id);
                Ok(Value::Matches(matches))
            }
            ExprKind::FtUnion(ft) => ft.evaluate(qc),
        }
    }

    /// Reports whether this expression can be answered by a direct
    /// index lookup, populating `ii` with the estimated cost and the
    /// replacement accessor when it can.
    ///
    /// A recorded cost of `0` is the reserved "provably empty"
    /// sentinel; callers must stop probing sibling operands when they
    /// see it.
    pub fn index_accessible(&self, ii: &mut IndexInfo) -> QueryResult<bool> {
        match &self.kind {
            ExprKind::CmpNum(range) => index::cmp_accessible(range.token(), ii),
            ExprKind::CmpStr(range) => index::str_accessible(range.token(), ii),
            ExprKind::And(exprs) => index::and_accessible(exprs, ii),
            _ => Ok(false),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, exprs: &[Expr], sep: &str) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, e) in exprs.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{e}")?;
            }
            write!(f, ")")
        }
        match &self.kind {
            ExprKind::Bool(value) => write!(f, "{value}()"),
            ExprKind::Empty => write!(f, "()"),
            ExprKind::Nodes(seq) => write!(f, "{seq}"),
            ExprKind::Var(name) => write!(f, "${name}"),
            ExprKind::And(exprs) => join(f, exprs, "and"),
            ExprKind::Or(exprs) => join(f, exprs, "or"),
            ExprKind::Not(expr) => write!(f, "not({expr})"),
            ExprKind::Pos(range) => write!(f, "{range}"),
            ExprKind::CmpNum(range) => write!(f, "{range}"),
            ExprKind::CmpStr(range) => write!(f, "{range}"),
            ExprKind::Intersect(exprs) => join(f, exprs, "intersect"),
            ExprKind::Union(exprs) => join(f, exprs, "union"),
            ExprKind::Except(exprs) => join(f, exprs, "except"),
            ExprKind::RangeAccess(access) => write!(f, "{access}"),
            ExprKind::StringAccess(access) => write!(f, "{access}"),
            ExprKind::FtMatches(matches) => write!(f, "ft:matches({})", matches.len()),
            ExprKind::FtUnion(ft) => write!(f, "{ft}"),
        }
    }
}
