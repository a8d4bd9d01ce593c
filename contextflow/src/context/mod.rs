//! The context store shared by the steps of a pipeline run.
//!
//! This module provides:
//! - The ordered key/value store steps read from and write to
//! - The value model and the shapes validation can assert
//! - Nested key addressing into composite values

mod path;
mod store;
mod value;

pub use path::{render as render_path, walk, KeyPath, PathSegment};
pub use store::Context;
pub use value::{has_value, kind_name, to_text, Value, ValueShape};
