//! Error types for the contextflow engine.
//!
//! Two families are kept apart: contract violations (the caller used a step
//! wrongly) and data errors (the context does not hold what a step needs).
//! Errors raised by external collaborators keep their own types and pass
//! through steps untouched.

use crate::context::ValueShape;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for contextflow operations.
#[derive(Debug, Error)]
pub enum ContextflowError {
    /// A step was invoked in a way its contract forbids.
    #[error("{0}")]
    ContractViolation(#[from] ContractViolationError),

    /// A key is absent from the context.
    #[error("{0}")]
    KeyNotFound(#[from] KeyNotFoundError),

    /// A key is present but holds no value.
    #[error("{0}")]
    KeyHasNoValue(#[from] KeyHasNoValueError),

    /// A key holds a value of the wrong shape.
    #[error("{0}")]
    KeyWrongType(#[from] KeyWrongTypeError),

    /// A placeholder chain revisits itself.
    #[error("{0}")]
    InterpolationCycle(#[from] InterpolationCycleError),

    /// The environment collaborator failed.
    #[error("{0}")]
    Environment(#[from] EnvironmentError),

    /// The archive collaborator failed.
    #[error("{0}")]
    Archive(#[from] ArchiveError),

    /// A context parser rejected its input.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A pipeline definition could not be loaded or resolved.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContextflowError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContractViolation(_) => "CONTEXT-001-CONTRACT",
            Self::KeyNotFound(_) => "CONTEXT-002-KEY_NOT_FOUND",
            Self::KeyHasNoValue(_) => "CONTEXT-003-KEY_NO_VALUE",
            Self::KeyWrongType(_) => "CONTEXT-004-KEY_WRONG_TYPE",
            Self::InterpolationCycle(_) => "CONTEXT-005-CYCLE",
            Self::Environment(EnvironmentError::NotFound { .. }) => "STEP-ENV-NOT_FOUND",
            Self::Environment(_) => "STEP-ENV-INVALID",
            Self::Archive(_) => "STEP-ARCHIVE",
            Self::Parse(_) => "PARSER-001",
            Self::Pipeline(PipelineError::UnknownStep { .. }) => "PIPELINE-001-UNKNOWN_STEP",
            Self::Pipeline(_) => "PIPELINE-002-DEFINITION",
            Self::Io(_) => "IO",
        }
    }

    /// Returns a fix hint for this error, if one is known.
    #[must_use]
    pub fn fix_hint(&self) -> Option<&'static str> {
        ErrorSuggestions::get(self.code())
    }

    /// Returns true for caller-misuse errors as opposed to data errors.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }

    /// Attributes a context error to `step` unless it already names one.
    ///
    /// The error kind never changes. Collaborator errors are returned as is.
    #[must_use]
    pub fn attribute_step(self, step: &str) -> Self {
        match self {
            Self::ContractViolation(e) if e.step.is_none() => {
                Self::ContractViolation(e.with_step(step))
            }
            Self::KeyNotFound(e) if e.step.is_none() => Self::KeyNotFound(e.with_step(step)),
            Self::KeyHasNoValue(e) if e.step.is_none() => Self::KeyHasNoValue(e.with_step(step)),
            Self::KeyWrongType(e) if e.step.is_none() => Self::KeyWrongType(e.with_step(step)),
            Self::InterpolationCycle(e) if e.step.is_none() => {
                Self::InterpolationCycle(e.with_step(step))
            }
            other => other,
        }
    }

    /// Returns the step the error is attributed to, if any.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::ContractViolation(e) => e.step.as_deref(),
            Self::KeyNotFound(e) => e.step.as_deref(),
            Self::KeyHasNoValue(e) => e.step.as_deref(),
            Self::KeyWrongType(e) => e.step.as_deref(),
            Self::InterpolationCycle(e) => e.step.as_deref(),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), json!(self.code()));
        map.insert("message".to_string(), json!(self.to_string()));

        if let Some(step) = self.step() {
            map.insert("step".to_string(), json!(step));
        }
        if let Some(hint) = self.fix_hint() {
            map.insert("fix_hint".to_string(), json!(hint));
        }

        match self {
            Self::KeyNotFound(e) => {
                map.insert("key".to_string(), json!(e.key));
                if let Some(ref by) = e.referenced_by {
                    map.insert("referenced_by".to_string(), json!(by));
                }
            }
            Self::KeyHasNoValue(e) => {
                map.insert("key".to_string(), json!(e.key));
            }
            Self::KeyWrongType(e) => {
                map.insert("key".to_string(), json!(e.key));
                map.insert("expected".to_string(), json!(e.expected.name()));
                map.insert("actual".to_string(), json!(e.actual));
            }
            Self::InterpolationCycle(e) => {
                map.insert("cycle".to_string(), json!(e.chain));
            }
            _ => {}
        }

        map
    }
}

/// Error raised when a step's calling contract is broken.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ContractViolationError {
    /// The error message.
    pub message: String,
    /// The step that raised it.
    pub step: Option<String>,
}

impl ContractViolationError {
    /// Creates a new contract violation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            step: None,
        }
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// The step was invoked without a context.
    #[must_use]
    pub fn missing_context(step: &str) -> Self {
        Self::new(format!("context must have value for {step}")).with_step(step)
    }

    /// None of the step's recognized keys are present.
    #[must_use]
    pub fn no_recognized_keys(keys: &[&str], step: &str) -> Self {
        Self::new(format!(
            "context must contain any combination of {} for {step}",
            join_alternatives(keys)
        ))
        .with_step(step)
    }
}

/// Joins keys as `a, b or c`.
pub(crate) fn join_alternatives(keys: &[&str]) -> String {
    match keys {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

/// Error raised when a key is missing from the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNotFoundError {
    /// The missing key (or full path for nested lookups).
    pub key: String,
    /// The key whose value referenced the missing key, if any.
    pub referenced_by: Option<String>,
    /// The step that needed the key.
    pub step: Option<String>,
}

impl KeyNotFoundError {
    /// Creates a new key-not-found error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            referenced_by: None,
            step: None,
        }
    }

    /// Records the key whose placeholder pointed at the missing key.
    #[must_use]
    pub fn referenced_by(mut self, key: impl Into<String>) -> Self {
        self.referenced_by = Some(key.into());
        self
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

impl fmt::Display for KeyNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.step, &self.referenced_by) {
            (Some(step), Some(by)) => write!(
                f,
                "{step} couldn't format {by}: {} not found in context.",
                self.key
            ),
            (Some(step), None) => write!(f, "{step} couldn't find {} in context.", self.key),
            (None, Some(by)) => {
                write!(f, "Unable to format {by}: {} not found in context.", self.key)
            }
            (None, None) => write!(f, "{} not found in context.", self.key),
        }
    }
}

impl std::error::Error for KeyNotFoundError {}

/// Error raised when a key exists but holds null or an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHasNoValueError {
    /// The key.
    pub key: String,
    /// The step that needed the value.
    pub step: Option<String>,
}

impl KeyHasNoValueError {
    /// Creates a new key-has-no-value error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            step: None,
        }
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

impl fmt::Display for KeyHasNoValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(
                f,
                "{step} found {} in context but it doesn't have a value.",
                self.key
            ),
            None => write!(f, "{} found in context but it doesn't have a value.", self.key),
        }
    }
}

impl std::error::Error for KeyHasNoValueError {}

/// Error raised when a key's value has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWrongTypeError {
    /// The key.
    pub key: String,
    /// The shape that was required.
    pub expected: ValueShape,
    /// The kind of value that was found.
    pub actual: &'static str,
    /// The step that needed the value.
    pub step: Option<String>,
}

impl KeyWrongTypeError {
    /// Creates a new wrong-type error.
    #[must_use]
    pub fn new(key: impl Into<String>, expected: ValueShape, actual: &'static str) -> Self {
        Self {
            key: key.into(),
            expected,
            actual,
            step: None,
        }
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

impl fmt::Display for KeyWrongTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(
                f,
                "{step} found {} in context, but it's not a {}.",
                self.key,
                self.expected.name()
            ),
            None => write!(
                f,
                "{} found in context, but it's not a {} (got {}).",
                self.key,
                self.expected.name(),
                self.actual
            ),
        }
    }
}

impl std::error::Error for KeyWrongTypeError {}

/// Error raised when placeholder resolution loops back on itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Interpolation cycle detected: {}", chain.join(" -> "))]
pub struct InterpolationCycleError {
    /// The locations forming the cycle; the first and last entries match.
    pub chain: Vec<String>,
    /// The step that triggered the resolution.
    pub step: Option<String>,
}

impl InterpolationCycleError {
    /// Creates a new cycle error.
    #[must_use]
    pub fn new(chain: Vec<String>) -> Self {
        Self { chain, step: None }
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

/// Errors raised by the environment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    /// The variable does not exist.
    #[error("environment variable {name} not found")]
    NotFound {
        /// The variable name.
        name: String,
    },

    /// The variable name cannot be used with the OS environment.
    #[error("invalid environment variable name {name:?}: {reason}")]
    InvalidName {
        /// The variable name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The value cannot be stored in the OS environment.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue {
        /// The variable name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl EnvironmentError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

/// Errors raised by the archive collaborator.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The mode string is not `r:<scheme>` or `w:<scheme>`.
    #[error("invalid archive mode '{mode}'")]
    InvalidMode {
        /// The rejected mode.
        mode: String,
    },

    /// The compression scheme is not supported.
    #[error("unsupported archive compression '{scheme}'")]
    UnsupportedCompression {
        /// The rejected scheme.
        scheme: String,
    },

    /// Reading or writing the archive failed.
    #[error("archive operation on {path} failed: {source}")]
    Io {
        /// The path being processed.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Wraps an IO error with the path it concerns.
    #[must_use]
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error raised when a context parser rejects its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{parser} parser: {message}")]
pub struct ParseError {
    /// The parser name.
    pub parser: String,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            message: message.into(),
        }
    }
}

/// Errors related to pipeline definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No step is registered under the name.
    #[error("step '{name}' is not registered")]
    UnknownStep {
        /// The step name.
        name: String,
    },

    /// The pipeline file does not exist.
    #[error("pipeline file {path} not found")]
    NotFound {
        /// The path that was tried.
        path: String,
    },

    /// The pipeline file is malformed.
    #[error("pipeline {path} is invalid: {message}")]
    Invalid {
        /// The pipeline path.
        path: String,
        /// The parse failure.
        message: String,
    },
}

/// Provides fix hints for error codes.
pub struct ErrorSuggestions;

impl ErrorSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "CONTEXT-001-CONTRACT" => Some(
                "Supply at least one of the step's recognized keys, either in the \
                 pipeline context or in the step's `in` block.",
            ),
            "CONTEXT-002-KEY_NOT_FOUND" => Some(
                "Set the key earlier in the pipeline or pass it with the context argument. \
                 Check placeholder spelling.",
            ),
            "CONTEXT-003-KEY_NO_VALUE" => Some(
                "The key is set but blank. Give it a value.",
            ),
            "CONTEXT-004-KEY_WRONG_TYPE" => Some(
                "Check the structure of the key against what the step expects.",
            ),
            "CONTEXT-005-CYCLE" => Some(
                "A placeholder refers back to itself. Break the chain by replacing \
                 one reference with a literal value.",
            ),
            "STEP-ENV-NOT_FOUND" => Some(
                "Export the variable before running the pipeline, or drop it from `envGet`.",
            ),
            "STEP-ARCHIVE" => Some(
                "Check the `in`/`out` paths and that `tarFormat` is one of '', gz, xz or bz2.",
            ),
            "PARSER-001" => Some(
                "Check the context argument matches the format of the chosen parser.",
            ),
            "PIPELINE-001-UNKNOWN_STEP" => Some(
                "Check the step name for typos. Built-in steps are `env` and `tar`.",
            ),
            "PIPELINE-002-DEFINITION" => Some(
                "Pipelines are read from `<dir>/<name>.yaml`. Check the name, the \
                 directory and the YAML syntax.",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_alternatives() {
        assert_eq!(join_alternatives(&["a"]), "a");
        assert_eq!(join_alternatives(&["a", "b"]), "a or b");
        assert_eq!(
            join_alternatives(&["envGet", "envSet", "envUnset"]),
            "envGet, envSet or envUnset"
        );
    }

    #[test]
    fn test_contract_violation_messages() {
        let err = ContractViolationError::missing_context("env");
        assert_eq!(err.to_string(), "context must have value for env");

        let err = ContractViolationError::no_recognized_keys(&["tarExtract", "tarArchive"], "tar");
        assert_eq!(
            err.to_string(),
            "context must contain any combination of tarExtract or tarArchive for tar"
        );
        assert_eq!(err.step.as_deref(), Some("tar"));
    }

    #[test]
    fn test_key_not_found_display() {
        assert_eq!(KeyNotFoundError::new("b").to_string(), "b not found in context.");
        assert_eq!(
            KeyNotFoundError::new("b").with_step("tar").to_string(),
            "tar couldn't find b in context."
        );
        assert_eq!(
            KeyNotFoundError::new("b").referenced_by("a").to_string(),
            "Unable to format a: b not found in context."
        );
    }

    #[test]
    fn test_wrong_type_display() {
        let err = KeyWrongTypeError::new("tarExtract", ValueShape::SequenceOfMappings, "string")
            .with_step("tar");
        assert_eq!(
            err.to_string(),
            "tar found tarExtract in context, but it's not a sequence of mappings."
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = InterpolationCycleError::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Interpolation cycle detected: a -> b -> a");
    }

    #[test]
    fn test_attribute_step_keeps_existing() {
        let err: ContextflowError = KeyNotFoundError::new("x").with_step("first").into();
        let err = err.attribute_step("second");
        assert_eq!(err.step(), Some("first"));

        let err: ContextflowError = KeyHasNoValueError::new("x").into();
        let err = err.attribute_step("second");
        assert!(matches!(err, ContextflowError::KeyHasNoValue(_)));
        assert_eq!(err.step(), Some("second"));
    }

    #[test]
    fn test_attribute_step_leaves_collaborator_errors() {
        let err: ContextflowError = EnvironmentError::not_found("HOME_X").into();
        let err = err.attribute_step("env");
        assert_eq!(err.step(), None);
        assert_eq!(err.to_string(), "environment variable HOME_X not found");
    }

    #[test]
    fn test_to_dict() {
        let err: ContextflowError = KeyNotFoundError::new("b").referenced_by("a").into();
        let dict = err.to_dict();

        assert_eq!(dict.get("code").unwrap(), "CONTEXT-002-KEY_NOT_FOUND");
        assert_eq!(dict.get("key").unwrap(), "b");
        assert_eq!(dict.get("referenced_by").unwrap(), "a");
        assert!(dict.contains_key("fix_hint"));
    }

    #[test]
    fn test_error_suggestions() {
        assert!(ErrorSuggestions::get("CONTEXT-005-CYCLE").is_some());
        assert!(ErrorSuggestions::get("UNKNOWN").is_none());
    }
}
