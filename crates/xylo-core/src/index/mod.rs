//! Value index abstractions.
//!
//! Tokens describe what a lookup asks for; the [`Data`](crate::Data)
//! trait answers them against a concrete store.

mod token;

pub use token::{IndexKind, NumericRange, StringRange};
