//! Sequential pipeline execution.

use super::definition::PipelineDefinition;
use super::registry::StepRegistry;
use crate::context::Context;
use crate::errors::ContextflowError;
use crate::steps::{run_step, Step};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// The pipeline name.
    pub pipeline: String,
    /// Names of the steps that ran, in order.
    pub steps_run: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last step finished.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs pipeline definitions against a shared context.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    registry: StepRegistry,
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new(StepRegistry::builtin())
    }
}

impl PipelineRunner {
    /// Creates a runner resolving steps from `registry`.
    #[must_use]
    pub fn new(registry: StepRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Runs every step of `definition` in order against `context`.
    ///
    /// Entries of the definition's `context` block are added for keys the
    /// caller has not already set. Each step's `in` block is written into
    /// the context just before the step runs. All step names are resolved
    /// before the first step runs. Execution stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStep` for an unregistered step, or the
    /// first error a step returns.
    pub fn run(
        &self,
        definition: &PipelineDefinition,
        context: &mut Context,
    ) -> Result<RunSummary, ContextflowError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("pipeline", pipeline = %definition.name, %run_id);
        let _enter = span.enter();

        let steps: Vec<Arc<dyn Step>> = definition
            .steps
            .iter()
            .map(|spec| self.registry.get(&spec.name))
            .collect::<Result<_, _>>()?;

        if let Some(defaults) = &definition.context {
            for (key, value) in defaults.iter() {
                if !context.has(key) {
                    context.set(key, value.clone());
                }
            }
        }

        info!(steps = steps.len(), "pipeline started");
        let mut steps_run = Vec::with_capacity(steps.len());

        for (index, (spec, step)) in definition.steps.iter().zip(steps).enumerate() {
            let span = info_span!("step", step = %spec.name, index);
            let _enter = span.enter();

            if let Some(input) = &spec.input {
                context.extend(input.clone());
            }

            info!("step started");
            if let Err(err) = run_step(step.as_ref(), Some(&mut *context)) {
                error!(code = err.code(), error = %err, "step failed");
                return Err(err);
            }
            info!("step completed");
            steps_run.push(spec.name.clone());
        }

        let summary = RunSummary {
            run_id,
            pipeline: definition.name.clone(),
            steps_run,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            steps = summary.steps_run.len(),
            duration_ms = summary.duration().num_milliseconds(),
            "pipeline completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::pipeline::StepSpec;
    use crate::testing::{context_from, FailingStep, MockStep, RecordingStep};
    use serde_json::json;

    fn registry_with(steps: Vec<Arc<dyn Step>>) -> StepRegistry {
        let mut registry = StepRegistry::new();
        for step in steps {
            registry.register(step);
        }
        registry
    }

    #[test]
    fn test_steps_run_in_order_and_share_context() {
        let first = Arc::new(MockStep::new("first").with_output("greeting", "hello {name}"));
        let second = Arc::new(RecordingStep::new("second"));
        let runner = PipelineRunner::new(registry_with(vec![
            first.clone() as Arc<dyn Step>,
            second.clone(),
        ]));
        let definition = PipelineDefinition::new("demo")
            .with_step(StepSpec::new("first"))
            .with_step(StepSpec::new("second"));

        let mut ctx = context_from(json!({"name": "world"}));
        let summary = runner.run(&definition, &mut ctx).unwrap();

        assert_eq!(summary.pipeline, "demo");
        assert_eq!(summary.steps_run, vec!["first", "second"]);
        assert!(summary.finished_at >= summary.started_at);
        assert_eq!(first.call_count(), 1);
        assert_eq!(
            second.seen()[0].get_formatted("greeting").unwrap(),
            json!("hello world")
        );
    }

    #[test]
    fn test_definition_context_does_not_override_caller() {
        let recorder = Arc::new(RecordingStep::new("record"));
        let runner = PipelineRunner::new(registry_with(vec![recorder.clone() as Arc<dyn Step>]));
        let definition = PipelineDefinition::new("demo")
            .with_context(context_from(json!({"a": "default", "b": "default"})))
            .with_step(StepSpec::new("record"));

        let mut ctx = context_from(json!({"a": "caller"}));
        runner.run(&definition, &mut ctx).unwrap();

        assert_eq!(ctx.get("a").unwrap(), &json!("caller"));
        assert_eq!(ctx.get("b").unwrap(), &json!("default"));
    }

    #[test]
    fn test_step_input_written_before_step() {
        let recorder = Arc::new(RecordingStep::new("record"));
        let runner = PipelineRunner::new(registry_with(vec![recorder.clone() as Arc<dyn Step>]));
        let definition = PipelineDefinition::new("demo")
            .with_step(StepSpec::new("record").with_input(context_from(json!({"a": 1}))))
            .with_step(StepSpec::new("record").with_input(context_from(json!({"a": 2}))));

        runner.run(&definition, &mut Context::new()).unwrap();

        let seen = recorder.seen();
        assert_eq!(seen[0].get("a").unwrap(), &json!(1));
        assert_eq!(seen[1].get("a").unwrap(), &json!(2));
    }

    #[test]
    fn test_unknown_step_fails_before_anything_runs() {
        let mock = Arc::new(MockStep::new("known"));
        let runner = PipelineRunner::new(registry_with(vec![mock.clone() as Arc<dyn Step>]));
        let definition = PipelineDefinition::new("demo")
            .with_step(StepSpec::new("known"))
            .with_step(StepSpec::new("unknown"));

        let err = runner.run(&definition, &mut Context::new()).unwrap_err();
        assert!(matches!(
            err,
            ContextflowError::Pipeline(PipelineError::UnknownStep { ref name }) if name == "unknown"
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_failure_stops_pipeline() {
        let after = Arc::new(MockStep::new("after"));
        let runner = PipelineRunner::new(registry_with(vec![
            Arc::new(FailingStep::new("broken", "no good")) as Arc<dyn Step>,
            after.clone(),
        ]));
        let definition = PipelineDefinition::new("demo")
            .with_step(StepSpec::new("broken"))
            .with_step(StepSpec::new("after"));

        let err = runner.run(&definition, &mut Context::new()).unwrap_err();
        assert_eq!(err.step(), Some("broken"));
        assert_eq!(after.call_count(), 0);
    }

    #[test]
    fn test_run_ids_are_unique() {
        let runner = PipelineRunner::new(StepRegistry::new());
        let definition = PipelineDefinition::new("empty");

        let a = runner.run(&definition, &mut Context::new()).unwrap();
        let b = runner.run(&definition, &mut Context::new()).unwrap();
        assert_ne!(a.run_id, b.run_id);
        assert!(a.steps_run.is_empty());
    }
}
