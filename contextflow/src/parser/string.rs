//! The whole argument into a single `argString` entry.

use super::ContextParser;
use crate::context::Context;
use crate::errors::ContextflowError;

/// Key the argument is stored under.
pub const ARG_STRING: &str = "argString";

/// Stores the argument verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl ContextParser for StringParser {
    fn name(&self) -> &'static str {
        "string"
    }

    fn example(&self) -> &'static str {
        "contextflow pipelinename 'arbitrary text'"
    }

    fn parse_text(&self, text: &str) -> Result<Context, ContextflowError> {
        let mut context = Context::new();
        context.set(ARG_STRING, text);
        Ok(context)
    }
}
