//! Testing utilities for contextflow pipelines.
//!
//! This module provides:
//! - Mock steps and a recording archiver
//! - Assertions for contexts and errors
//! - Context builders

mod assertions;
mod mocks;

pub use assertions::{
    assert_context_contains, assert_context_value, assert_contract_violation,
    assert_error_code, assert_formatted_value,
};
pub use mocks::{ArchiveCall, FailingStep, MockStep, RecordingArchiver, RecordingStep};

use crate::context::{Context, Value};

/// Builds a context from a JSON mapping.
///
/// # Panics
///
/// Panics if `value` is not a mapping.
#[must_use]
pub fn context_from(value: Value) -> Context {
    match value {
        Value::Object(map) => Context::from(map),
        other => panic!("context must be built from a mapping, got {other}"),
    }
}
