//! The `env` step: read, write and remove environment variables.
//!
//! | key        | shape                           | effect                       |
//! |------------|---------------------------------|------------------------------|
//! | `envGet`   | mapping context-key -> env-name | copies variables into context|
//! | `envSet`   | mapping env-name -> template    | sets variables               |
//! | `envUnset` | sequence of env-names           | removes variables            |
//!
//! Sub-operations run in that order, so values fetched by `envGet` can be
//! interpolated into `envSet` templates in the same invocation.

use super::dispatch::SubOperation;
use super::environment::{Environment, ProcessEnvironment};
use super::Step;
use crate::context::{kind_name, to_text, Context, PathSegment, Value, ValueShape};
use crate::errors::{ContextflowError, KeyWrongTypeError};
use std::sync::Arc;
use tracing::debug;

/// Step name used in messages and in the registry.
pub const STEP_NAME: &str = "env";
/// Enables [`env_get`].
pub const ENV_GET: &str = "envGet";
/// Enables [`env_set`].
pub const ENV_SET: &str = "envSet";
/// Enables [`env_unset`].
pub const ENV_UNSET: &str = "envUnset";

/// Gets, sets and unsets environment variables.
#[derive(Debug, Clone)]
pub struct EnvStep {
    environment: Arc<dyn Environment>,
}

impl EnvStep {
    /// Creates the step over `environment`.
    #[must_use]
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self { environment }
    }

    /// Creates the step over the process environment.
    #[must_use]
    pub fn process() -> Self {
        Self::new(Arc::new(ProcessEnvironment::new()))
    }
}

impl Default for EnvStep {
    fn default() -> Self {
        Self::process()
    }
}

impl Step for EnvStep {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn operations(&self) -> Vec<SubOperation<'_>> {
        let env = self.environment.as_ref();
        vec![
            SubOperation::new(ENV_GET, ValueShape::Mapping, move |ctx| env_get(ctx, env)),
            SubOperation::new(ENV_SET, ValueShape::Mapping, move |ctx| env_set(ctx, env)),
            SubOperation::new(ENV_UNSET, ValueShape::Sequence, move |ctx| {
                env_unset(ctx, env)
            }),
        ]
    }
}

/// Copies environment variables into the context.
///
/// Each `context-key: env-name` entry of `envGet` sets `context-key` to the
/// value of the (interpolated) variable name.
///
/// # Errors
///
/// Returns `NotFound` for an unset variable, or any interpolation error.
pub fn env_get(
    context: &mut Context,
    environment: &dyn Environment,
) -> Result<(), ContextflowError> {
    for (context_key, env_name) in raw_mapping(context, ENV_GET)? {
        let location = entry_location(ENV_GET, PathSegment::Key(context_key.clone()));
        let env_name = to_text(&context.format_at(&location, &env_name)?);
        let value = environment.get(&env_name)?;
        debug!(%context_key, %env_name, "read environment variable");
        context.set(context_key, value);
    }
    Ok(())
}

/// Sets environment variables from `envSet`.
///
/// Both the variable names and the value templates are interpolated.
///
/// # Errors
///
/// Returns any interpolation or environment error.
pub fn env_set(
    context: &mut Context,
    environment: &dyn Environment,
) -> Result<(), ContextflowError> {
    for (raw_name, template) in raw_mapping(context, ENV_SET)? {
        let location = entry_location(ENV_SET, PathSegment::Key(raw_name.clone()));
        let env_name = to_text(&context.format_at(&location, &Value::String(raw_name))?);
        let value = to_text(&context.format_at(&location, &template)?);
        environment.set(&env_name, &value)?;
        debug!(%env_name, "set environment variable");
    }
    Ok(())
}

/// Removes every variable named in `envUnset`.
///
/// # Errors
///
/// Returns any interpolation or environment error.
pub fn env_unset(
    context: &mut Context,
    environment: &dyn Environment,
) -> Result<(), ContextflowError> {
    let names = match context.get(ENV_UNSET)? {
        Value::Array(items) => items.clone(),
        other => return Err(wrong_type(ENV_UNSET, ValueShape::Sequence, other)),
    };
    for (index, name) in names.iter().enumerate() {
        let location = entry_location(ENV_UNSET, PathSegment::Index(index));
        let env_name = to_text(&context.format_at(&location, name)?);
        environment.unset(&env_name)?;
        debug!(%env_name, "unset environment variable");
    }
    Ok(())
}

/// Clones the mapping at `key` so the context can be written while iterating.
fn raw_mapping(
    context: &Context,
    key: &str,
) -> Result<serde_json::Map<String, Value>, ContextflowError> {
    match context.get(key)? {
        Value::Object(map) => Ok(map.clone()),
        other => Err(wrong_type(key, ValueShape::Mapping, other)),
    }
}

fn entry_location(key: &str, entry: PathSegment) -> [PathSegment; 2] {
    [PathSegment::Key(key.to_string()), entry]
}

fn wrong_type(key: &str, expected: ValueShape, actual: &Value) -> ContextflowError {
    KeyWrongTypeError::new(key, expected, kind_name(actual)).into()
}
