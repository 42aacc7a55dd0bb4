//! Query evaluation state and results.

mod context;
mod value;

pub use context::{CancellationToken, Focus, QueryContext};
pub use value::Value;
