//! A JSON object into context entries.

use super::ContextParser;
use crate::context::{kind_name, Context, Value};
use crate::errors::{ContextflowError, ParseError};

/// Parses the argument as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ContextParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn example(&self) -> &'static str {
        r#"contextflow pipelinename '{"key1":"value1","key2":"value2"}'"#
    }

    fn parse_text(&self, text: &str) -> Result<Context, ContextflowError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Context::from(map)),
            Ok(other) => Err(ParseError::new(
                self.name(),
                format!("expected a JSON object, got {}", kind_name(&other)),
            )
            .into()),
            Err(err) => Err(ParseError::new(self.name(), err.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_parses_in_order() {
        let ctx = JsonParser
            .parse(Some(r#"{"b": 1, "a": {"nested": [true]}}"#))
            .unwrap();
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(ctx.get("a").unwrap(), &json!({"nested": [true]}));
    }

    #[test]
    fn test_arbitrary_string_fails() {
        let err = JsonParser.parse(Some("value 1,value 2, value3")).unwrap_err();
        assert!(matches!(err, ContextflowError::Parse(_)));
    }

    #[test]
    fn test_non_object_fails() {
        let err = JsonParser.parse(Some("[1, 2]")).unwrap_err();
        assert_eq!(err.to_string(), "json parser: expected a JSON object, got sequence");
    }
}
