//! Per-query evaluation state.
//!
//! A [`QueryContext`] is created once per query execution and threaded
//! through every `evaluate` call. It carries the storage handle, the
//! cooperative stop token, the scoring flag, variable bindings, and the
//! current focus for positional and comparison predicates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use xylo_core::Data;

use crate::error::{QueryError, QueryResult};
use crate::eval::value::Value;

/// A clonable handle used to request cancellation of a running query.
///
/// All clones share one flag. Evaluation polls the flag at the start of
/// every unbounded loop iteration; cancellation is advisory, a long
/// single step between checks is not interrupted mid-step.
///
/// # Example
///
/// ```
/// use xylo_query::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. All clones observe the request.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// The current focus item for predicate evaluation.
///
/// Positional predicates read `position`; range comparisons read the
/// typed views of the focused value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Focus {
    /// 1-based position of the focused item in its sequence.
    pub position: i64,
    /// Numeric view of the focused value, when one exists.
    pub number: Option<f64>,
    /// String view of the focused value, when one exists.
    pub string: Option<String>,
}

impl Focus {
    /// Creates a focus at `position` with no typed value.
    #[must_use]
    pub fn at(position: i64) -> Self {
        Self { position, number: None, string: None }
    }

    /// Sets the numeric view.
    #[must_use]
    pub fn with_number(mut self, number: f64) -> Self {
        self.number = Some(number);
        self
    }

    /// Sets the string view.
    #[must_use]
    pub fn with_string(mut self, string: impl Into<String>) -> Self {
        self.string = Some(string.into());
        self
    }
}

/// Per-query evaluation state, one instance per query execution.
///
/// The scoring flag is fixed for the duration of the run. Evaluation
/// order within one context is always left to right as written.
pub struct QueryContext {
    data: Arc<dyn Data>,
    token: CancellationToken,
    scoring: bool,
    bindings: HashMap<String, Value>,
    focus: Option<Focus>,
}

impl QueryContext {
    /// Creates a context over `data` with scoring disabled and a fresh
    /// stop token.
    #[must_use]
    pub fn new(data: Arc<dyn Data>) -> Self {
        Self {
            data,
            token: CancellationToken::new(),
            scoring: false,
            bindings: HashMap::new(),
            focus: None,
        }
    }

    /// Enables or disables relevance scoring for this run.
    #[must_use]
    pub fn with_scoring(mut self, scoring: bool) -> Self {
        self.scoring = scoring;
        self
    }

    /// Uses `token` as this query's stop source.
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Binds a variable for the duration of the run.
    #[must_use]
    pub fn with_binding(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Sets the current focus item.
    #[must_use]
    pub fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = Some(focus);
        self
    }

    /// The storage handle queries evaluate against.
    #[must_use]
    pub fn data(&self) -> &Arc<dyn Data> {
        &self.data
    }

    /// Whether relevance scoring is enabled for this run.
    #[inline]
    #[must_use]
    pub fn scoring(&self) -> bool {
        self.scoring
    }

    /// Looks up a variable binding.
    pub fn binding(&self, name: &str) -> QueryResult<&Value> {
        self.bindings
            .get(name)
            .ok_or_else(|| QueryError::Static(format!("unbound variable ${name}")))
    }

    /// The current focus, raising a type error when none is set.
    pub fn focus(&self) -> QueryResult<&Focus> {
        self.focus.as_ref().ok_or_else(|| QueryError::Type {
            expected: "context item".into(),
            actual: "none".into(),
        })
    }

    /// Polls the stop token, raising [`QueryError::Interrupted`] when
    /// cancellation has been requested.
    ///
    /// Called at the start of every unbounded loop iteration in set
    /// operations and index streaming.
    #[inline]
    pub fn check_stop(&self) -> QueryResult<()> {
        if self.token.is_cancelled() {
            return Err(QueryError::Interrupted);
        }
        Ok(())
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("scoring", &self.scoring)
            .field("bindings", &self.bindings.len())
            .field("focus", &self.focus)
            .finish()
    }
}
