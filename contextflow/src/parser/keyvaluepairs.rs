//! `k1=v1,k2=v2` into one context entry per pair.

use super::ContextParser;
use crate::context::Context;
use crate::errors::{ContextflowError, ParseError};
use tracing::debug;

/// Parses comma-separated `key=value` pairs.
///
/// Each element splits at its first `=`, so values may contain `=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValuePairsParser;

impl ContextParser for KeyValuePairsParser {
    fn name(&self) -> &'static str {
        "keyvaluepairs"
    }

    fn example(&self) -> &'static str {
        "contextflow pipelinename 'key1=value1,key2=value2'"
    }

    fn parse_text(&self, text: &str) -> Result<Context, ContextflowError> {
        debug!("parsing key value pairs");
        let mut context = Context::new();
        for element in text.split(',') {
            let (key, value) = element.split_once('=').ok_or_else(|| {
                ParseError::new(
                    self.name(),
                    format!("element '{element}' is not a key=value pair"),
                )
            })?;
            context.set(key, value);
        }
        Ok(context)
    }
}
