//! Index lookup tokens.
//!
//! A token describes a key range that an index can answer. The query
//! layer builds tokens during optimization and hands them to a
//! [`Data`](crate::Data) implementation for cost estimation and
//! retrieval.

use serde::{Deserialize, Serialize};

/// The kind of value index a token addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// Index over text node values.
    Text,
    /// Index over attribute values.
    Attribute,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Attribute => write!(f, "attribute"),
        }
    }
}

/// An inclusive numeric key range for a value index lookup.
///
/// Both bounds are inclusive. A range with `min > max` matches nothing;
/// index implementations report such lookups as zero-cost.
///
/// # Example
///
/// ```
/// use xylo_core::{IndexKind, NumericRange};
///
/// let range = NumericRange::new(IndexKind::Text, 1.0, 10.0);
/// assert!(range.contains(5.0));
/// assert!(!range.contains(10.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Index this range addresses.
    pub kind: IndexKind,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl NumericRange {
    /// Creates a new inclusive numeric range.
    #[inline]
    #[must_use]
    pub fn new(kind: IndexKind, min: f64, max: f64) -> Self {
        Self { kind, min, max }
    }

    /// Returns `true` if the range matches no key at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Returns `true` if `value` falls inside the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Intersects two ranges over the same index.
    ///
    /// Returns `None` when the ranges address different indexes or do
    /// not overlap. The overlap requirement keeps disjoint predicates
    /// separate so each can still be answered individually.
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
        Some(Self::new(self.kind, min, max))
    }
}

impl std::fmt::Display for NumericRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}, {}]", self.kind, self.min, self.max)
    }
}

/// A string key range for a value index lookup.
///
/// Unlike [`NumericRange`], each bound carries its own inclusiveness
/// flag, mirroring the four comparison operators that produce string
/// ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringRange {
    /// Index this range addresses.
    pub kind: IndexKind,
    /// Lower bound.
    pub min: String,
    /// Whether the lower bound itself matches.
    pub min_incl: bool,
    /// Upper bound.
    pub max: String,
    /// Whether the upper bound itself matches.
    pub max_incl: bool,
}

impl StringRange {
    /// Creates a new string range.
    #[must_use]
    pub fn new(kind: IndexKind, min: String, min_incl: bool, max: String, max_incl: bool) -> Self {
        Self { kind, min, min_incl, max, max_incl }
    }

    /// Returns `true` if the range matches no key at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.min.cmp(&self.max) {
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => !(self.min_incl && self.max_incl),
            std::cmp::Ordering::Greater => true,
        }
    }

    /// Returns `true` if `value` falls inside the range.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        let above = if self.min_incl { value >= self.min.as_str() } else { value > self.min.as_str() };
        let below = if self.max_incl { value <= self.max.as_str() } else { value < self.max.as_str() };
        above && below
    }

    /// Intersects two ranges over the same index.
    ///
    /// Returns `None` when the ranges address different indexes or do
    /// not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.kind != other.kind {
            return None;
        }
        let (min, min_incl) = match self.min.cmp(&other.min) {
            std::cmp::Ordering::Greater => (self.min.clone(), self.min_incl),
            std::cmp::Ordering::Less => (other.min.clone(), other.min_incl),
            std::cmp::Ordering::Equal => (self.min.clone(), self.min_incl && other.min_incl),
        };
        let (max, max_incl) = match self.max.cmp(&other.max) {
            std::cmp::Ordering::Less => (self.max.clone(), self.max_incl),
            std::cmp::Ordering::Greater => (other.max.clone(), other.max_incl),
            std::cmp::Ordering::Equal => (self.max.clone(), self.max_incl && other.max_incl),
        };
        let merged = Self::new(self.kind, min, min_incl, max, max_incl);
        if merged.is_empty() {
            return None;
        }
        Some(merged)
    }
}

impl std::fmt::Display for StringRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lo = if self.min_incl { '[' } else { '(' };
        let hi = if self.max_incl { ']' } else { ')' };
        write!(f, "{}{lo}{}, {}{hi}", self.kind, self.min, self.max)
    }
}
