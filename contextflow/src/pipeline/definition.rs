//! Pipeline definitions and the YAML loader.

use crate::context::Context;
use crate::errors::{ContextflowError, PipelineError};
use crate::parser::ParserKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of pipeline definitions.
pub const PIPELINE_EXTENSION: &str = "yaml";

/// One entry of a pipeline's `steps` list.
///
/// Written either as a bare step name or as a mapping with `name` and an
/// optional `in` block whose entries are written into the context just
/// before the step runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStepSpec")]
pub struct StepSpec {
    /// The registered step name.
    pub name: String,
    /// Entries written into the context before the step runs.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Context>,
}

impl StepSpec {
    /// Creates a step entry without an `in` block.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
        }
    }

    /// Sets the `in` block.
    #[must_use]
    pub fn with_input(mut self, input: Context) -> Self {
        self.input = Some(input);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStepSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(rename = "in", default)]
        input: Option<Context>,
    },
}

impl From<RawStepSpec> for StepSpec {
    fn from(raw: RawStepSpec) -> Self {
        match raw {
            RawStepSpec::Name(name) => Self::new(name),
            RawStepSpec::Detailed { name, input } => Self { name, input },
        }
    }
}

/// A pipeline as written in its definition file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// The pipeline name. Defaults to the file stem when loaded from disk.
    #[serde(default)]
    pub name: String,
    /// Parser for the command-line context argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_parser: Option<ParserKind>,
    /// Initial context entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

impl PipelineDefinition {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    /// Sets the initial context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the context parser.
    #[must_use]
    pub fn with_context_parser(mut self, parser: ParserKind) -> Self {
        self.context_parser = Some(parser);
        self
    }

    /// Parses a definition from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Invalid` when the text is not a valid
    /// definition.
    pub fn from_yaml(text: &str) -> Result<Self, PipelineError> {
        parse(text, "<inline>")
    }
}

fn parse(text: &str, origin: &str) -> Result<PipelineDefinition, PipelineError> {
    serde_yaml::from_str(text).map_err(|err| PipelineError::Invalid {
        path: origin.to_string(),
        message: err.to_string(),
    })
}

/// Returns the path of pipeline `name` under `dir`.
#[must_use]
pub fn pipeline_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{PIPELINE_EXTENSION}"))
}

/// Loads `<dir>/<name>.yaml`.
///
/// # Errors
///
/// Returns `PipelineError::NotFound` when the file does not exist,
/// `PipelineError::Invalid` when it does not parse, and an IO error for
/// any other read failure.
pub fn load_pipeline(dir: &Path, name: &str) -> Result<PipelineDefinition, ContextflowError> {
    let path = pipeline_path(dir, name);
    let shown = path.display().to_string();
    debug!(path = %shown, "loading pipeline");

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(PipelineError::NotFound { path: shown }.into());
        }
        Err(err) => return Err(err.into()),
    };

    let mut definition = parse(&text, &shown)?;
    if definition.name.is_empty() {
        definition.name = name.to_string();
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context_from;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
context_parser: keyvaluepairs
context:
  archive_dir: ./out
  version: 3
steps:
  - env
  - name: tar
    in:
      tarArchive:
        - in: ./src
          out: "{archive_dir}/pkg.tar.xz"
"#;

    #[test]
    fn test_parse_both_step_forms() {
        let definition = PipelineDefinition::from_yaml(SAMPLE).unwrap();

        assert_eq!(definition.context_parser, Some(ParserKind::KeyValuePairs));
        assert_eq!(
            definition.context,
            Some(context_from(json!({"archive_dir": "./out", "version": 3})))
        );
        assert_eq!(definition.steps.len(), 2);
        assert_eq!(definition.steps[0], StepSpec::new("env"));
        assert_eq!(
            definition.steps[1],
            StepSpec::new("tar").with_input(context_from(json!({
                "tarArchive": [{"in": "./src", "out": "{archive_dir}/pkg.tar.xz"}],
            })))
        );
    }

    #[test]
    fn test_placeholders_kept_verbatim() {
        let definition = PipelineDefinition::from_yaml("context:\n  a: '{b}'\n").unwrap();
        let context = definition.context.unwrap();
        assert_eq!(context.get("a").unwrap(), &json!("{b}"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PipelineDefinition::from_yaml("steps: {not: [a, list").unwrap_err();
        assert!(matches!(err, PipelineError::Invalid { .. }));
    }

    #[test]
    fn test_load_pipeline_names_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(pipeline_path(dir.path(), "build"), SAMPLE).unwrap();

        let definition = load_pipeline(dir.path(), "build").unwrap();
        assert_eq!(definition.name, "build");
        assert_eq!(definition.steps.len(), 2);
    }

    #[test]
    fn test_load_missing_pipeline() {
        let dir = TempDir::new().unwrap();
        let err = load_pipeline(dir.path(), "nope").unwrap_err();
        match err {
            ContextflowError::Pipeline(PipelineError::NotFound { path }) => {
                assert!(path.ends_with("nope.yaml"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
