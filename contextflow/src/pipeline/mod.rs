//! Pipeline loading and execution.
//!
//! This module provides:
//! - Pipeline definitions read from YAML
//! - The step registry
//! - The sequential runner

mod definition;
mod registry;
mod runner;

pub use definition::{
    load_pipeline, pipeline_path, PipelineDefinition, StepSpec, PIPELINE_EXTENSION,
};
pub use registry::StepRegistry;
pub use runner::{PipelineRunner, RunSummary};

use crate::config::RunConfig;
use crate::context::Context;
use crate::errors::ContextflowError;
use crate::parser::ParserKind;
use tracing::warn;

/// Builds the initial context for `definition` from the context argument.
///
/// Without a parser the argument is ignored.
///
/// # Errors
///
/// Returns the parser's error.
pub fn initial_context(
    config: &RunConfig,
    definition: &PipelineDefinition,
) -> Result<Context, ContextflowError> {
    match (effective_parser(config, definition), &config.context_arg) {
        (Some(parser), arg) => parser.parse(arg.as_deref()),
        (None, Some(_)) => {
            warn!(
                pipeline = %definition.name,
                "context argument ignored: no context parser configured"
            );
            Ok(Context::new())
        }
        (None, None) => Ok(Context::new()),
    }
}

/// Loads, parses and runs the pipeline named in `config`.
///
/// Returns the run summary together with the final context.
///
/// # Errors
///
/// Returns any loading, parsing or step error.
pub fn run_pipeline(
    config: &RunConfig,
    runner: &PipelineRunner,
) -> Result<(RunSummary, Context), ContextflowError> {
    let definition = load_pipeline(&config.pipelines_dir, &config.pipeline)?;
    let mut context = initial_context(config, &definition)?;
    let summary = runner.run(&definition, &mut context)?;
    Ok((summary, context))
}

/// Returns the parser for the context argument: the one named in `config`,
/// else the pipeline's.
#[must_use]
pub fn effective_parser(config: &RunConfig, definition: &PipelineDefinition) -> Option<ParserKind> {
    config.parser.or(definition.context_parser)
}
