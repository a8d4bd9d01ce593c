//! Configuration for a single pipeline invocation.

use crate::parser::ParserKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything needed to run one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Name of the pipeline file without extension.
    pub pipeline: String,
    /// The raw context argument, handed to the context parser.
    #[serde(default)]
    pub context_arg: Option<String>,
    /// Parser for `context_arg`. Overrides the pipeline's own setting.
    #[serde(default)]
    pub parser: Option<ParserKind>,
    /// Directory holding pipeline files.
    #[serde(default = "default_pipelines_dir")]
    pub pipelines_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_pipelines_dir() -> PathBuf {
    PathBuf::from("pipelines")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RunConfig {
    /// Creates a configuration for `pipeline` with defaults.
    #[must_use]
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            context_arg: None,
            parser: None,
            pipelines_dir: default_pipelines_dir(),
            log_level: default_log_level(),
        }
    }

    /// Sets the context argument.
    #[must_use]
    pub fn with_context_arg(mut self, arg: impl Into<String>) -> Self {
        self.context_arg = Some(arg.into());
        self
    }

    /// Sets the context parser.
    #[must_use]
    pub fn with_parser(mut self, parser: ParserKind) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the pipelines directory.
    #[must_use]
    pub fn with_pipelines_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pipelines_dir = dir.into();
        self
    }

    /// Sets the default log filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::new("build");
        assert_eq!(config.pipelines_dir, PathBuf::from("pipelines"));
        assert_eq!(config.log_level, "info");
        assert!(config.parser.is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"pipeline": "build", "parser": "list"}"#).unwrap();
        assert_eq!(config.parser, Some(ParserKind::List));
        assert_eq!(config.pipelines_dir, PathBuf::from("pipelines"));
    }
}
