//! Step trait and the built-in steps.
//!
//! A step is a named unit of work that reads and writes the shared
//! [`Context`]. Most steps expose a fixed set of optional sub-operations,
//! each enabled by the presence of a recognized key, and let
//! [`dispatch`] decide which ones run.

mod archive;
mod dispatch;
pub mod env;
mod environment;
pub mod tar;

pub use archive::{ArchiveMode, Archiver, Compression, TarArchiver};
pub use dispatch::{dispatch, SubOperation};
pub use env::EnvStep;
pub use environment::{Environment, InMemoryEnvironment, ProcessEnvironment};
pub use self::tar::TarStep;

use crate::context::Context;
use crate::errors::ContextflowError;
use crate::validation::assert_context_present;
use std::fmt::Debug;

/// Trait for pipeline steps.
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// The step's sub-operations in execution order.
    ///
    /// Steps that do their own dispatch may return an empty list and
    /// override [`Step::run`] instead.
    fn operations(&self) -> Vec<SubOperation<'_>> {
        Vec::new()
    }

    /// Executes the step against `context`.
    ///
    /// # Errors
    ///
    /// Returns the first validation, interpolation or collaborator failure.
    fn run(&self, context: &mut Context) -> Result<(), ContextflowError> {
        dispatch(self.name(), &self.operations(), context).map(|_| ())
    }
}

/// Entry point the engine uses to run a step.
///
/// # Errors
///
/// Returns a `ContractViolation` when no context was supplied, otherwise
/// whatever the step returns.
pub fn run_step(step: &dyn Step, context: Option<&mut Context>) -> Result<(), ContextflowError> {
    let context = assert_context_present(context, step.name())?;
    step.run(context)
}

/// A simple function-based step.
pub struct FnStep<F>
where
    F: Fn(&mut Context) -> Result<(), ContextflowError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStep<F>
where
    F: Fn(&mut Context) -> Result<(), ContextflowError> + Send + Sync,
{
    /// Creates a new function-based step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStep<F>
where
    F: Fn(&mut Context) -> Result<(), ContextflowError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

impl<F> Step for FnStep<F>
where
    F: Fn(&mut Context) -> Result<(), ContextflowError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, context: &mut Context) -> Result<(), ContextflowError> {
        (self.func)(context)
    }
}
