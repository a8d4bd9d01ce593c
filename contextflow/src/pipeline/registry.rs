//! Step registry resolving step names from pipeline definitions.

use crate::errors::PipelineError;
use crate::steps::{Archiver, EnvStep, Environment, Step, TarStep};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of named steps.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: IndexMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `env` and `tar` steps over
    /// the process environment and the local filesystem.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EnvStep::process()));
        registry.register(Arc::new(TarStep::default()));
        registry
    }

    /// Creates a registry holding the built-in steps over the given
    /// collaborators.
    #[must_use]
    pub fn builtin_with(environment: Arc<dyn Environment>, archiver: Arc<dyn Archiver>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EnvStep::new(environment)));
        registry.register(Arc::new(TarStep::new(archiver)));
        registry
    }

    /// Registers `step` under its own name, returning any step it replaces.
    pub fn register(&mut self, step: Arc<dyn Step>) -> Option<Arc<dyn Step>> {
        let name = step.name().to_string();
        self.register_as(name, step)
    }

    /// Registers `step` under `name`, returning any step it replaces.
    pub fn register_as(
        &mut self,
        name: impl Into<String>,
        step: Arc<dyn Step>,
    ) -> Option<Arc<dyn Step>> {
        self.steps.insert(name.into(), step)
    }

    /// Resolves a step by name.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStep` when nothing is registered under
    /// `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Step>, PipelineError> {
        self.steps
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownStep {
                name: name.to_string(),
            })
    }

    /// Returns true if a step is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Lists registered step names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}
