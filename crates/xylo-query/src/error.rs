//! Error types for query compilation and evaluation.

use thiserror::Error;

/// Errors raised while optimizing or evaluating a query expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A compile-time constraint violation, raised during optimization
    /// before any evaluation begins.
    #[error("static error: {0}")]
    Static(String),

    /// A runtime value did not have the item kind the operation needs.
    #[error("type error: expected {expected}, got {actual}")]
    Type {
        /// The item kind the operation required.
        expected: String,
        /// The item kind actually produced.
        actual: String,
    },

    /// The query was cancelled through its stop token.
    ///
    /// This is a clean termination, not a data error; it unwinds the
    /// evaluation stack and is reported to the caller as interrupted.
    #[error("query interrupted")]
    Interrupted,

    /// A fatal, non-retriable resource limit was hit.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Result alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
