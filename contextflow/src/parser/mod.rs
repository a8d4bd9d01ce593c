//! Parsers that turn the command-line context argument into an initial
//! [`Context`].

mod json;
mod keyvaluepairs;
mod list;
mod string;

pub use json::JsonParser;
pub use keyvaluepairs::KeyValuePairsParser;
pub use list::{ListParser, ARG_LIST};
pub use string::{StringParser, ARG_STRING};

use crate::context::Context;
use crate::errors::{ContextflowError, ContractViolationError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Turns a free-text argument into context entries.
pub trait ContextParser: Send + Sync + fmt::Debug {
    /// Returns the parser name.
    fn name(&self) -> &'static str;

    /// An example argument, used in the message for missing input.
    fn example(&self) -> &'static str;

    /// Parses a non-empty argument.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` when the argument is malformed.
    fn parse_text(&self, text: &str) -> Result<Context, ContextflowError>;

    /// Parses the argument, rejecting missing or empty input.
    ///
    /// # Errors
    ///
    /// Returns a `ContractViolation` when `input` is missing or empty, and
    /// a `ParseError` when it is malformed.
    fn parse(&self, input: Option<&str>) -> Result<Context, ContextflowError> {
        match input {
            Some(text) if !text.is_empty() => self.parse_text(text),
            _ => Err(ContractViolationError::new(format!(
                "pipeline must be invoked with context arg set. For this {} parser \
                 you're looking for something like: {}.",
                self.name(),
                self.example()
            ))
            .into()),
        }
    }
}

/// The built-in parsers, by the name used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// `k1=v1,k2=v2`
    KeyValuePairs,
    /// `a,b,c` under `argList`
    List,
    /// A JSON object
    Json,
    /// The whole argument under `argString`
    String,
}

impl ParserKind {
    /// Every parser kind.
    pub const ALL: [Self; 4] = [Self::KeyValuePairs, Self::List, Self::Json, Self::String];

    /// Returns the command-line name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyValuePairs => "keyvaluepairs",
            Self::List => "list",
            Self::Json => "json",
            Self::String => "string",
        }
    }

    /// Returns the parser implementation.
    #[must_use]
    pub fn parser(self) -> Box<dyn ContextParser> {
        match self {
            Self::KeyValuePairs => Box::new(KeyValuePairsParser),
            Self::List => Box::new(ListParser),
            Self::Json => Box::new(JsonParser),
            Self::String => Box::new(StringParser),
        }
    }

    /// Parses `input` with this kind's parser.
    ///
    /// # Errors
    ///
    /// As [`ContextParser::parse`].
    pub fn parse(self, input: Option<&str>) -> Result<Context, ContextflowError> {
        self.parser().parse(input)
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                ParseError::new(
                    "context",
                    format!("unknown parser '{s}', expected one of {}", known.join(", ")),
                )
            })
    }
}
