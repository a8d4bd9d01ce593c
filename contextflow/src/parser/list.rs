//! `a,b,c` into a single `argList` sequence.

use super::ContextParser;
use crate::context::{Context, Value};
use crate::errors::ContextflowError;

/// Key the parsed list is stored under.
pub const ARG_LIST: &str = "argList";

/// Splits the argument on commas. Whitespace is kept as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParser;

impl ContextParser for ListParser {
    fn name(&self) -> &'static str {
        "list"
    }

    fn example(&self) -> &'static str {
        "contextflow pipelinename 'spam,eggs' OR: contextflow pipelinename 'spam'"
    }

    fn parse_text(&self, text: &str) -> Result<Context, ContextflowError> {
        let items = text.split(',').map(Value::from).collect();
        let mut context = Context::new();
        context.set(ARG_LIST, Value::Array(items));
        Ok(context)
    }
}
