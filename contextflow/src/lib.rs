//! # Contextflow
//!
//! A shared, interpolated key/value context for sequential pipelines of
//! steps.
//!
//! Contextflow provides:
//!
//! - **Context store**: an ordered store of JSON-like values that every step
//!   reads from and writes to
//! - **Interpolation**: `{key}` placeholders resolved lazily against the
//!   current store, with cycle detection and native type preservation
//! - **Validation**: precondition checks with actionable messages
//! - **Step dispatch**: presence-driven selection of a step's sub-operations
//! - **Built-in steps**: `env` and `tar`, over swappable collaborators
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contextflow::prelude::*;
//!
//! let mut context = Context::new();
//! context.set("name", "widget");
//! context.set("envSet", serde_json::json!({"BUILD_NAME": "{name}-release"}));
//!
//! run_step(&EnvStep::process(), Some(&mut context))?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod errors;
pub mod interpolation;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod steps;
pub mod testing;
pub mod validation;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::context::{Context, KeyPath, Value, ValueShape};
    pub use crate::errors::{
        ContextflowError, ContractViolationError, ErrorSuggestions, InterpolationCycleError,
        KeyHasNoValueError, KeyNotFoundError, KeyWrongTypeError,
    };
    pub use crate::interpolation::Interpolator;
    pub use crate::parser::{ContextParser, ParserKind};
    pub use crate::pipeline::{
        load_pipeline, run_pipeline, PipelineDefinition, PipelineRunner, RunSummary,
        StepRegistry, StepSpec,
    };
    pub use crate::steps::{
        dispatch, run_step, Archiver, EnvStep, Environment, InMemoryEnvironment,
        ProcessEnvironment, Step, SubOperation, TarArchiver, TarStep,
    };
    pub use crate::validation::{
        assert_any_of_keys_exists, assert_context_present, assert_key_exists,
        assert_key_has_value, assert_key_type, assert_keys_exist,
    };
}
