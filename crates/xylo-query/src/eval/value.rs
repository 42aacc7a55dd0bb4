//! Evaluation results.

use xylo_core::NodeSeq;

use crate::error::{QueryError, QueryResult};
use crate::expr::FtMatch;

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean result, optionally carrying a relevance score.
    Bool {
        /// The truth value.
        value: bool,
        /// Relevance score in `[0, 1]`, present only when scoring is
        /// enabled and the operand chain produced one.
        score: Option<f64>,
    },
    /// A document-order sorted, duplicate-free node sequence.
    Nodes(NodeSeq),
    /// A full-text match stream, sorted by document position.
    Matches(Vec<FtMatch>),
    /// The empty sequence.
    Empty,
}

impl Value {
    /// An unscored boolean.
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Bool { value, score: None }
    }

    /// Effective boolean value.
    ///
    /// Booleans are themselves; a node sequence is `true` when
    /// non-empty; a match stream is `true` when it holds a positive
    /// match; the empty sequence is `false`.
    pub fn ebv(&self) -> QueryResult<bool> {
        match self {
            Self::Bool { value, .. } => Ok(*value),
            Self::Nodes(seq) => Ok(!seq.is_empty()),
            Self::Matches(matches) => Ok(matches.iter().any(|m| !m.not)),
            Self::Empty => Ok(false),
        }
    }

    /// The relevance score attached to this value, if any.
    #[inline]
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Bool { score, .. } => *score,
            _ => None,
        }
    }

    /// Extracts the node sequence, raising a type error otherwise.
    ///
    /// A match stream collapses to its positively matched nodes so
    /// full-text results can feed the node set operators.
    pub fn into_nodes(self) -> QueryResult<NodeSeq> {
        match self {
            Self::Nodes(seq) => Ok(seq),
            Self::Matches(matches) => Ok(NodeSeq::from_nodes(
                matches.into_iter().filter(|m| !m.not).map(|m| m.node).collect(),
            )),
            Self::Empty => Ok(NodeSeq::new()),
            Self::Bool { .. } => Err(QueryError::Type {
                expected: "node sequence".into(),
                actual: "boolean".into(),
            }),
        }
    }

    /// Extracts the full-text match stream, raising a type error
    /// otherwise.
    pub fn into_matches(self) -> QueryResult<Vec<FtMatch>> {
        match self {
            Self::Matches(matches) => Ok(matches),
            Self::Empty => Ok(Vec::new()),
            Self::Nodes(_) => Err(QueryError::Type {
                expected: "full-text matches".into(),
                actual: "node sequence".into(),
            }),
            Self::Bool { .. } => Err(QueryError::Type {
                expected: "full-text matches".into(),
                actual: "boolean".into(),
            }),
        }
    }
}
