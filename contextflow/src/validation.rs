//! Precondition checks every step runs before touching a collaborator.
//!
//! The checks are side-effect free. Each failure names the step and the key
//! so the message is actionable on its own.

use crate::context::{has_value, kind_name, Context, ValueShape};
use crate::errors::{
    ContextflowError, ContractViolationError, KeyHasNoValueError, KeyNotFoundError,
    KeyWrongTypeError,
};

/// Asserts that the engine supplied a context.
///
/// Works for both `Option<&Context>` and `Option<&mut Context>`.
///
/// # Errors
///
/// Returns a `ContractViolation` when `context` is `None`.
pub fn assert_context_present<T>(context: Option<T>, step: &str) -> Result<T, ContextflowError> {
    context.ok_or_else(|| ContractViolationError::missing_context(step).into())
}

/// Asserts that `key` is bound.
///
/// # Errors
///
/// Returns `KeyNotFound` when the key is absent.
pub fn assert_key_exists(context: &Context, key: &str, step: &str) -> Result<(), ContextflowError> {
    if context.has(key) {
        Ok(())
    } else {
        Err(KeyNotFoundError::new(key).with_step(step).into())
    }
}

/// Asserts that every key in `keys` is bound.
///
/// # Errors
///
/// Returns `KeyNotFound` for the first absent key.
pub fn assert_keys_exist(
    context: &Context,
    keys: &[&str],
    step: &str,
) -> Result<(), ContextflowError> {
    keys.iter().try_for_each(|key| assert_key_exists(context, key, step))
}

/// Asserts that `key` is bound to something other than null or `""`.
///
/// # Errors
///
/// Returns `KeyNotFound` when absent and `KeyHasNoValue` when empty.
pub fn assert_key_has_value(
    context: &Context,
    key: &str,
    step: &str,
) -> Result<(), ContextflowError> {
    assert_key_exists(context, key, step)?;
    match context.value(key) {
        Some(value) if has_value(value) => Ok(()),
        _ => Err(KeyHasNoValueError::new(key).with_step(step).into()),
    }
}

/// Asserts that the raw value bound to `key` has the `expected` shape.
///
/// # Errors
///
/// Returns `KeyNotFound` when absent and `KeyWrongType` on a shape mismatch.
pub fn assert_key_type(
    context: &Context,
    key: &str,
    expected: ValueShape,
    step: &str,
) -> Result<(), ContextflowError> {
    let value = context
        .value(key)
        .ok_or_else(|| KeyNotFoundError::new(key).with_step(step))?;
    if expected.matches(value) {
        Ok(())
    } else {
        Err(KeyWrongTypeError::new(key, expected, kind_name(value))
            .with_step(step)
            .into())
    }
}

/// Asserts that at least one of `keys` is bound.
///
/// # Errors
///
/// Returns a `ContractViolation` naming every alternative when none is.
pub fn assert_any_of_keys_exists(
    context: &Context,
    keys: &[&str],
    step: &str,
) -> Result<(), ContextflowError> {
    if keys.iter().any(|key| context.has(key)) {
        Ok(())
    } else {
        Err(ContractViolationError::no_recognized_keys(keys, step).into())
    }
}
