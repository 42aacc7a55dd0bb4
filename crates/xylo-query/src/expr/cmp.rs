//! Predicate ranges for positional and value comparisons.
//!
//! These are the merge units of the conjunction optimizer: adjacent
//! predicates of the same shape intersect into a single tighter
//! predicate when their bounds allow it.

use xylo_core::{IndexKind, NumericRange, StringRange};

/// A positional predicate, `min <= position() <= max` with 1-based,
/// inclusive bounds.
///
/// # Example
///
/// ```
/// use xylo_query::PosRange;
///
/// let merged = PosRange::exact(2).intersect(&PosRange::new(1, 5));
/// assert_eq!(merged, PosRange::exact(2));
/// assert!(PosRange::exact(2).intersect(&PosRange::exact(3)).is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosRange {
    /// Inclusive lower position bound.
    pub min: i64,
    /// Inclusive upper position bound.
    pub max: i64,
}

impl PosRange {
    /// Creates a positional range.
    #[inline]
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// A predicate matching exactly position `k`.
    #[inline]
    #[must_use]
    pub fn exact(k: i64) -> Self {
        Self { min: k, max: k }
    }

    /// Returns `true` if no position satisfies the predicate.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Returns `true` if `position` satisfies the predicate.
    #[inline]
    #[must_use]
    pub fn matches(&self, position: i64) -> bool {
        position >= self.min && position <= self.max
    }

    /// Intersects two positional predicates.
    ///
    /// Always produces a result; disjoint inputs yield an empty range,
    /// which the conjunction optimizer folds to the false constant.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self { min: self.min.max(other.min), max: self.max.min(other.max) }
    }
}

impl std::fmt::Display for PosRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "position() = {}", self.min)
        } else {
            write!(f, "position() = {} to {}", self.min, self.max)
        }
    }
}

/// A numeric range comparison over the focused value, with inclusive
/// bounds.
///
/// When `kind` is set the predicate addresses a value index and can be
/// answered by a range scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumRange {
    /// The value index this predicate could be answered by, if any.
    pub kind: Option<IndexKind>,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl NumRange {
    /// Creates a numeric range predicate with no index candidate.
    #[inline]
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { kind: None, min, max }
    }

    /// Creates a numeric range predicate addressing a value index.
    #[inline]
    #[must_use]
    pub fn indexed(kind: IndexKind, min: f64, max: f64) -> Self {
        Self { kind: Some(kind), min, max }
    }

    /// Returns `true` if `value` satisfies the predicate.
    #[inline]
    #[must_use]
    pub fn matches(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Intersects two numeric predicates.
    ///
    /// Merges only when both address the same index candidate and the
    /// bounds overlap; disjoint predicates stay separate.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.kind != other.kind {
            return None;
        }
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min > max {
            return None;
        }
        Some(Self { kind: self.kind, min, max })
    }

    /// The index token this predicate answers to, when it has an index
    /// candidate.
    #[must_use]
    pub fn token(&self) -> Option<NumericRange> {
        self.kind.map(|kind| NumericRange::new(kind, self.min, self.max))
    }
}

impl std::fmt::Display for NumRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ". = {} to {}", self.min, self.max)
    }
}

/// A lexicographic string range comparison over the focused value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrRange {
    /// The value index this predicate could be answered by, if any.
    pub kind: Option<IndexKind>,
    /// Lower bound.
    pub min: String,
    /// Whether the lower bound itself matches.
    pub min_incl: bool,
    /// Upper bound.
    pub max: String,
    /// Whether the upper bound itself matches.
    pub max_incl: bool,
}

impl StrRange {
    /// Creates a string range predicate with no index candidate.
    #[must_use]
    pub fn new(min: impl Into<String>, min_incl: bool, max: impl Into<String>, max_incl: bool) -> Self {
        Self { kind: None, min: min.into(), min_incl, max: max.into(), max_incl }
    }

    /// Creates a string range predicate addressing a value index.
    #[must_use]
    pub fn indexed(
        kind: IndexKind,
        min: impl Into<String>,
        min_incl: bool,
        max: impl Into<String>,
        max_incl: bool,
    ) -> Self {
        Self { kind: Some(kind), min: min.into(), min_incl, max: max.into(), max_incl }
    }

    /// Returns `true` if `value` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        let above = if self.min_incl { value >= self.min.as_str() } else { value > self.min.as_str() };
        let below = if self.max_incl { value <= self.max.as_str() } else { value < self.max.as_str() };
        above && below
    }

    /// Intersects two string predicates.
    ///
    /// Merges only when both address the same index candidate and the
    /// bounds overlap; disjoint predicates stay separate.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.kind != other.kind {
            return None;
        }
        let lhs = self.string_token();
        let rhs = other.string_token();
        let merged = lhs.intersect(&rhs)?;
        Some(Self {
            kind: self.kind,
            min: merged.min,
            min_incl: merged.min_incl,
            max: merged.max,
            max_incl: merged.max_incl,
        })
    }

    /// The index token this predicate answers to, when it has an index
    /// candidate.
    #[must_use]
    pub fn token(&self) -> Option<StringRange> {
        self.kind.map(|kind| {
            StringRange::new(kind, self.min.clone(), self.min_incl, self.max.clone(), self.max_incl)
        })
    }

    // Bound arithmetic lives on the core token type; the kind used here
    // is irrelevant when both sides carry the same one.
    fn string_token(&self) -> StringRange {
        StringRange::new(
            self.kind.unwrap_or(IndexKind::Text),
            self.min.clone(),
            self.min_incl,
            self.max.clone(),
            self.max_incl,
        )
    }
}

impl std::fmt::Display for StrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lo = if self.min_incl { ">=" } else { ">" };
        let hi = if self.max_incl { "<=" } else { "<" };
        write!(f, ". {lo} '{}' and . {hi} '{}'", self.min, self.max)
    }
}
