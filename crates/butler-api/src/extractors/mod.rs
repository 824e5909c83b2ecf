//! Axum extractors for request handling
//!
//! Custom extractors for validation and typed path ids.

mod path;
mod validated;

pub use path::{SnowflakePath, TaskIdPath};
pub use validated::{ValidatedJson, ValidatedQuery};
