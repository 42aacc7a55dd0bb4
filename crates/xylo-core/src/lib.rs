//! # XyloDB Core
//!
//! Core types for the XyloDB query engine: the structural node model,
//! sorted node sequences, index lookup tokens, and the storage access
//! trait that query evaluation runs against.
//!
//! ## Example
//!
//! ```
//! use xylo_core::{Node, NodeId, NodeKind, NodeSeq};
//!
//! let seq = NodeSeq::from_nodes(vec![
//!     Node::new(NodeId::new(4), NodeKind::Element),
//!     Node::new(NodeId::new(2), NodeKind::Text),
//!     Node::new(NodeId::new(4), NodeKind::Element),
//! ]);
//! assert_eq!(seq.len(), 2);
//! assert_eq!(seq.first().map(|n| n.id.as_u64()), Some(2));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

mod data;
pub mod index;
pub mod types;

pub use data::{Data, MemData};
pub use index::{IndexKind, NumericRange, StringRange};
pub use types::{Node, NodeId, NodeKind, NodeSeq, ScoredNode};
