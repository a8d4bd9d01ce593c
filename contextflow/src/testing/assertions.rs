//! Test assertions for contexts and errors.

use crate::context::{Context, Value};
use crate::errors::ContextflowError;

/// Asserts that the context binds `key`.
pub fn assert_context_contains(context: &Context, key: &str) {
    assert!(
        context.has(key),
        "Expected context to contain key '{}', but it doesn't. Keys: {:?}",
        key,
        context.keys().collect::<Vec<_>>()
    );
}

/// Asserts that the raw value bound to `key` equals `expected`.
pub fn assert_context_value(context: &Context, key: &str, expected: &Value) {
    let actual = context.value(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {:?} for key '{}', got {:?}",
        expected,
        key,
        actual
    );
}

/// Asserts that the formatted value of `key` equals `expected`.
pub fn assert_formatted_value(context: &Context, key: &str, expected: &Value) {
    match context.get_formatted(key) {
        Ok(actual) => assert_eq!(
            &actual, expected,
            "Expected formatted value {:?} for key '{}', got {:?}",
            expected, key, actual
        ),
        Err(err) => panic!("Expected key '{key}' to format, got error: {err}"),
    }
}

/// Asserts that the result failed with the given error code.
pub fn assert_error_code<T: std::fmt::Debug>(result: &Result<T, ContextflowError>, code: &str) {
    match result {
        Err(err) => assert_eq!(
            err.code(),
            code,
            "Expected error code {}, got {} ({})",
            code,
            err.code(),
            err
        ),
        Ok(value) => panic!("Expected error {code}, got Ok({value:?})"),
    }
}

/// Asserts that the result failed with a contract violation.
pub fn assert_contract_violation<T: std::fmt::Debug>(result: &Result<T, ContextflowError>) {
    match result {
        Err(err) => assert!(
            err.is_contract_violation(),
            "Expected contract violation, got {} ({})",
            err.code(),
            err
        ),
        Ok(value) => panic!("Expected contract violation, got Ok({value:?})"),
    }
}
