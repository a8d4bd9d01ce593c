//! Presence-driven dispatch of a step's sub-operations.

use crate::context::{Context, ValueShape};
use crate::errors::ContextflowError;
use crate::validation::{assert_any_of_keys_exists, assert_key_has_value, assert_key_type};
use std::fmt::{self, Debug};
use tracing::debug;

type OperationFn<'a> = Box<dyn Fn(&mut Context) -> Result<(), ContextflowError> + 'a>;

/// One optional behaviour of a step, enabled by the presence of `key`.
pub struct SubOperation<'a> {
    key: &'static str,
    shape: ValueShape,
    run: OperationFn<'a>,
}

impl<'a> SubOperation<'a> {
    /// Creates a sub-operation enabled by `key`, whose value must have
    /// `shape`.
    pub fn new(
        key: &'static str,
        shape: ValueShape,
        run: impl Fn(&mut Context) -> Result<(), ContextflowError> + 'a,
    ) -> Self {
        Self {
            key,
            shape,
            run: Box::new(run),
        }
    }

    /// The key that enables this sub-operation.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The shape the key's value must have.
    #[must_use]
    pub fn shape(&self) -> ValueShape {
        self.shape
    }
}

impl Debug for SubOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubOperation")
            .field("key", &self.key)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Runs every sub-operation whose key is present, in the given order.
///
/// Fails with a `ContractViolation` naming all recognized keys when none is
/// present. Every present key is validated (has a value, has the required
/// shape) before the first sub-operation runs. Sub-operation errors
/// propagate; context errors without a step are attributed to `step`.
///
/// Returns the keys whose sub-operations ran.
///
/// # Errors
///
/// Returns the first validation or sub-operation failure.
pub fn dispatch(
    step: &str,
    operations: &[SubOperation<'_>],
    context: &mut Context,
) -> Result<Vec<&'static str>, ContextflowError> {
    let recognized: Vec<&str> = operations.iter().map(SubOperation::key).collect();
    assert_any_of_keys_exists(context, &recognized, step)?;

    let selected: Vec<&SubOperation<'_>> = operations
        .iter()
        .filter(|operation| context.has(operation.key))
        .collect();

    for operation in &selected {
        assert_key_has_value(context, operation.key, step)?;
        assert_key_type(context, operation.key, operation.shape, step)?;
    }

    let mut ran = Vec::with_capacity(selected.len());
    for operation in selected {
        debug!(step, operation = operation.key, "running sub-operation");
        (operation.run)(context).map_err(|err| err.attribute_step(step))?;
        ran.push(operation.key);
    }

    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder<'a>(
        log: &'a Mutex<Vec<&'static str>>,
        key: &'static str,
        shape: ValueShape,
    ) -> SubOperation<'a> {
        SubOperation::new(key, shape, move |_ctx| {
            log.lock().push(key);
            Ok(())
        })
    }

    #[test]
    fn test_no_recognized_key_is_contract_violation() {
        let log = Mutex::new(Vec::new());
        let ops = vec![
            recorder(&log, "readIt", ValueShape::Mapping),
            recorder(&log, "writeIt", ValueShape::Mapping),
        ];
        let mut ctx = Context::new();
        ctx.set("arbkey", "arbvalue");

        let err = dispatch("demo", &ops, &mut ctx).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(
            err.to_string(),
            "context must contain any combination of readIt or writeIt for demo"
        );
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_runs_only_present_operation() {
        let log = Mutex::new(Vec::new());
        let ops = vec![
            recorder(&log, "readIt", ValueShape::Mapping),
            recorder(&log, "writeIt", ValueShape::Mapping),
            recorder(&log, "dropIt", ValueShape::Sequence),
        ];
        let mut ctx = Context::new();
        ctx.set("dropIt", json!(["X"]));

        let ran = dispatch("demo", &ops, &mut ctx).unwrap();
        assert_eq!(ran, vec!["dropIt"]);
        assert_eq!(*log.lock(), vec!["dropIt"]);
    }

    #[test]
    fn test_runs_all_present_in_declared_order() {
        let log = Mutex::new(Vec::new());
        let ops = vec![
            recorder(&log, "readIt", ValueShape::Mapping),
            recorder(&log, "writeIt", ValueShape::Mapping),
            recorder(&log, "dropIt", ValueShape::Sequence),
        ];
        let mut ctx = Context::new();
        ctx.set("dropIt", json!([]));
        ctx.set("writeIt", json!({}));
        ctx.set("readIt", json!({}));

        dispatch("demo", &ops, &mut ctx).unwrap();
        assert_eq!(*log.lock(), vec!["readIt", "writeIt", "dropIt"]);
    }

    #[test]
    fn test_earlier_operation_output_visible_to_later() {
        let seen = Mutex::new(None);
        let ops = vec![
            SubOperation::new("fetch", ValueShape::Any, |ctx: &mut Context| {
                ctx.set("fetched", "fresh");
                Ok(())
            }),
            SubOperation::new("use", ValueShape::String, |ctx: &mut Context| {
                *seen.lock() = Some(ctx.get_formatted("use")?);
                Ok(())
            }),
        ];
        let mut ctx = Context::new();
        ctx.set("fetched", "stale");
        ctx.set("fetch", true);
        ctx.set("use", "value is {fetched}");

        dispatch("demo", &ops, &mut ctx).unwrap();
        assert_eq!(*seen.lock(), Some(json!("value is fresh")));
    }

    #[test]
    fn test_validation_happens_before_any_operation() {
        let log = Mutex::new(Vec::new());
        let ops = vec![
            recorder(&log, "readIt", ValueShape::Mapping),
            recorder(&log, "writeIt", ValueShape::Mapping),
        ];
        let mut ctx = Context::new();
        ctx.set("readIt", json!({"a": "b"}));
        ctx.set("writeIt", "not a mapping");

        let err = dispatch("demo", &ops, &mut ctx).unwrap_err();
        assert!(matches!(err, ContextflowError::KeyWrongType(_)));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_present_but_empty_is_key_has_no_value() {
        let log = Mutex::new(Vec::new());
        let ops = vec![recorder(&log, "readIt", ValueShape::Mapping)];
        let mut ctx = Context::new();
        ctx.set("readIt", serde_json::Value::Null);

        let err = dispatch("demo", &ops, &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "demo found readIt in context but it doesn't have a value."
        );
    }

    #[test]
    fn test_operation_errors_propagate_with_step_attribution() {
        let ops = vec![SubOperation::new("readIt", ValueShape::Any, |ctx: &mut Context| {
            ctx.get_formatted("missing").map(|_| ())
        })];
        let mut ctx = Context::new();
        ctx.set("readIt", 1);

        let err = dispatch("demo", &ops, &mut ctx).unwrap_err();
        assert!(matches!(err, ContextflowError::KeyNotFound(_)));
        assert_eq!(err.step(), Some("demo"));
    }
}
