//! Core data types for XyloDB.
//!
//! This module defines the fundamental types that represent structural
//! nodes, node sequences, and scored results in the document model.

mod node;
mod scored;
mod sequence;

pub use node::{Node, NodeId, NodeKind};
pub use scored::ScoredNode;
pub use sequence::NodeSeq;
