//! Placeholder interpolation against a [`Context`].
//!
//! A placeholder is `{path}` where `path` names a context key, optionally
//! followed by a nested path (`{a.b}`, `{a[0].b}`). `{{` and `}}` produce
//! literal braces. Resolution is recursive: a referenced value is itself
//! resolved before it is substituted.
//!
//! When a string is exactly one placeholder, the referenced value keeps its
//! native type. When a placeholder is embedded in other text the referenced
//! value is rendered as text.

use crate::context::{render_path, to_text, Context, KeyPath, PathSegment, Value};
use crate::errors::{ContextflowError, InterpolationCycleError, KeyNotFoundError};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::trace;

#[allow(clippy::expect_used)]
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([^{}]+)\}").expect("placeholder pattern is valid")
    })
}

/// Resolves placeholders against a context, tracking the chain of
/// locations being resolved so that cycles fail instead of recursing.
///
/// Each reference is resolved at most once per interpolator; later uses of
/// the same placeholder reuse the first result.
#[derive(Debug)]
pub struct Interpolator<'c> {
    context: &'c Context,
    stack: Vec<Vec<PathSegment>>,
    resolved: HashMap<String, Value>,
}

impl<'c> Interpolator<'c> {
    /// Creates an interpolator over `context`.
    #[must_use]
    pub fn new(context: &'c Context) -> Self {
        Self {
            context,
            stack: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    /// Resolves the value stored at `key` (or nested path).
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` or `InterpolationCycle`.
    pub fn resolve(&mut self, key: &str) -> Result<Value, ContextflowError> {
        self.resolve_reference(None, key)
    }

    /// Resolves every placeholder in a value that is not itself stored in
    /// the context.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` or `InterpolationCycle`.
    pub fn format(&mut self, value: &Value) -> Result<Value, ContextflowError> {
        self.format_at(None, value)
    }

    /// Resolves every placeholder in `value`, which lives at `location`.
    ///
    /// A missing reference is attributed to `location`, and a reference
    /// back to `location` is a cycle.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` or `InterpolationCycle`.
    pub fn format_located(
        &mut self,
        location: &[PathSegment],
        value: &Value,
    ) -> Result<Value, ContextflowError> {
        self.format_at(Some(location), value)
    }

    fn format_at(
        &mut self,
        location: Option<&[PathSegment]>,
        value: &Value,
    ) -> Result<Value, ContextflowError> {
        if let Some(loc) = location {
            if let Some(start) = self.stack.iter().position(|entry| entry == loc) {
                let mut chain: Vec<String> =
                    self.stack[start..].iter().map(|entry| render_path(entry)).collect();
                chain.push(render_path(loc));
                return Err(InterpolationCycleError::new(chain).into());
            }
            self.stack.push(loc.to_vec());
        }

        let result = match value {
            Value::String(text) => self.format_string(location, text),
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let child = location.map(|loc| child_location(loc, PathSegment::Index(index)));
                    resolved.push(self.format_at(child.as_deref(), item)?);
                }
                Ok(Value::Array(resolved))
            }
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    let child =
                        location.map(|loc| child_location(loc, PathSegment::Key(key.clone())));
                    resolved.insert(key.clone(), self.format_at(child.as_deref(), item)?);
                }
                Ok(Value::Object(resolved))
            }
            scalar => Ok(scalar.clone()),
        };

        if location.is_some() {
            self.stack.pop();
        }
        result
    }

    fn format_string(
        &mut self,
        location: Option<&[PathSegment]>,
        text: &str,
    ) -> Result<Value, ContextflowError> {
        if !text.contains(|c: char| c == '{' || c == '}') {
            return Ok(Value::String(text.to_string()));
        }

        let regex = placeholder_regex();

        if let Some(caps) = regex.captures(text) {
            if let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) {
                if whole.start() == 0 && whole.end() == text.len() {
                    return self.resolve_reference(location, token.as_str());
                }
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.substitute(location, &caps)?);
            last = whole.end();
        }
        out.push_str(&text[last..]);

        Ok(Value::String(out))
    }

    fn substitute(
        &mut self,
        location: Option<&[PathSegment]>,
        caps: &Captures<'_>,
    ) -> Result<String, ContextflowError> {
        match caps.get(1) {
            Some(token) => {
                let value = self.resolve_reference(location, token.as_str())?;
                Ok(to_text(&value))
            }
            None if &caps[0] == "{{" => Ok("{".to_string()),
            None => Ok("}".to_string()),
        }
    }

    fn resolve_reference(
        &mut self,
        location: Option<&[PathSegment]>,
        token: &str,
    ) -> Result<Value, ContextflowError> {
        if let Some(value) = self.resolved.get(token) {
            return Ok(value.clone());
        }
        let value = self.lookup_reference(location, token)?;
        self.resolved.insert(token.to_string(), value.clone());
        Ok(value)
    }

    fn lookup_reference(
        &mut self,
        location: Option<&[PathSegment]>,
        token: &str,
    ) -> Result<Value, ContextflowError> {
        trace!(token, referenced_by = ?location.map(render_path), "resolving placeholder");

        let not_found = || -> ContextflowError {
            let err = KeyNotFoundError::new(token);
            match location {
                Some(loc) => err.referenced_by(render_path(loc)).into(),
                None => err.into(),
            }
        };

        let context = self.context;

        // A top-level key spelled like a path wins over nested lookup.
        if let Some(raw) = context.value(token) {
            let loc = vec![PathSegment::Key(token.to_string())];
            return self.format_at(Some(&loc), raw);
        }

        let path = KeyPath::parse(token).ok_or_else(not_found)?;
        let mut current = context.value(path.root()).ok_or_else(not_found)?;
        let mut loc = vec![PathSegment::Key(path.root().to_string())];

        for (position, segment) in path.rest().iter().enumerate() {
            if current.is_string() {
                let resolved = self.format_at(Some(&loc), current)?;
                return crate::context::walk(&resolved, &path.rest()[position..])
                    .cloned()
                    .ok_or_else(not_found);
            }
            let (child, normalised) = segment.lookup(current).ok_or_else(not_found)?;
            current = child;
            loc.push(normalised);
        }

        self.format_at(Some(&loc), current)
    }
}

fn child_location(parent: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut child = Vec::with_capacity(parent.len() + 1);
    child.extend_from_slice(parent);
    child.push(segment);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context(value: Value) -> Context {
        match value {
            Value::Object(map) => Context::from(map),
            _ => panic!("test context must be a mapping"),
        }
    }

    #[test]
    fn test_direct_reference() {
        let ctx = context(json!({"a": "{b}", "b": "x"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("x"));
    }

    #[test]
    fn test_transitive_reference() {
        let ctx = context(json!({"a": "{b}", "b": "{c}", "c": "x"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("x"));
    }

    #[test]
    fn test_embedded_references() {
        let ctx = context(json!({
            "key1": "value1",
            "key2": "value2",
            "msg": "blah blah {key2} and {key1} goes here.",
        }));
        assert_eq!(
            ctx.get_formatted("msg").unwrap(),
            json!("blah blah value2 and value1 goes here.")
        );
    }

    #[test]
    fn test_single_placeholder_preserves_native_type() {
        let ctx = context(json!({
            "b": 4,
            "flag": false,
            "list": [1, 2],
            "map": {"k": "v"},
            "a": "{b}",
            "f": "{flag}",
            "l": "{list}",
            "m": "{map}",
        }));

        assert_eq!(ctx.get_formatted("a").unwrap(), json!(4));
        assert_eq!(ctx.get_formatted("f").unwrap(), json!(false));
        assert_eq!(ctx.get_formatted("l").unwrap(), json!([1, 2]));
        assert_eq!(ctx.get_formatted("m").unwrap(), json!({"k": "v"}));
    }

    #[test]
    fn test_embedded_placeholder_coerces_to_string() {
        let ctx = context(json!({"b": 4, "a": "n={b}", "c": " {b}"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("n=4"));
        assert_eq!(ctx.get_formatted("c").unwrap(), json!(" 4"));
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let ctx = context(json!({"a": "{a}"}));
        let err = ctx.get_formatted("a").unwrap_err();

        match err {
            ContextflowError::InterpolationCycle(e) => assert_eq!(e.chain, vec!["a", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_indirect_cycle_names_chain() {
        let ctx = context(json!({"a": "x {b}", "b": "y {c}", "c": "{a}"}));
        let err = ctx.get_formatted("a").unwrap_err();

        assert_eq!(err.to_string(), "Interpolation cycle detected: a -> b -> c -> a");
    }

    #[test]
    fn test_cycle_inside_composite() {
        let ctx = context(json!({"a": {"inner": ["{a}"]}}));
        let err = ctx.get_formatted("a").unwrap_err();
        assert!(matches!(err, ContextflowError::InterpolationCycle(_)));
    }

    #[test]
    fn test_sibling_reference_is_not_cycle() {
        let ctx = context(json!({"a": {"x": "1", "y": "{a.x}-2"}}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!({"x": "1", "y": "1-2"}));
    }

    #[test]
    fn test_repeated_reference_is_not_cycle() {
        let ctx = context(json!({"a": "{b}{b}", "b": "x"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("xx"));
    }

    #[test]
    fn test_missing_reference_names_key() {
        let ctx = context(json!({"a": "{b}"}));
        let err = ctx.get_formatted("a").unwrap_err();

        match err {
            ContextflowError::KeyNotFound(e) => {
                assert_eq!(e.key, "b");
                assert_eq!(e.referenced_by.as_deref(), Some("a"));
            }
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_nested_reference_names_location() {
        let ctx = context(json!({"cfg": {"out": "{dir}/x"}}));
        let err = ctx.get_formatted("cfg").unwrap_err();

        match err {
            ContextflowError::KeyNotFound(e) => {
                assert_eq!(e.key, "dir");
                assert_eq!(e.referenced_by.as_deref(), Some("cfg.out"));
            }
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_path_reference() {
        let ctx = context(json!({
            "build": {"targets": [{"name": "api"}, {"name": "web"}]},
            "first": "{build.targets[0].name}",
            "second": "{build.targets.1.name}!",
        }));

        assert_eq!(ctx.get_formatted("first").unwrap(), json!("api"));
        assert_eq!(ctx.get_formatted("second").unwrap(), json!("web!"));
    }

    #[test]
    fn test_path_through_placeholder_leaf() {
        let ctx = context(json!({
            "alias": "{real}",
            "real": {"port": 8080},
            "url": "http://localhost:{alias.port}",
        }));
        assert_eq!(ctx.get_formatted("url").unwrap(), json!("http://localhost:8080"));
    }

    #[test]
    fn test_nested_values_are_resolved_recursively() {
        let ctx = context(json!({
            "pkg": "widget",
            "ver": 3,
            "artifact": {"name": "{pkg}", "files": ["{pkg}-{ver}.tar", "{ver}"]},
        }));

        assert_eq!(
            ctx.get_formatted("artifact").unwrap(),
            json!({"name": "widget", "files": ["widget-3.tar", 3]})
        );
    }

    #[test]
    fn test_composite_failure_fails_whole_resolution() {
        let ctx = context(json!({"list": ["ok", "{missing}"]}));
        assert!(ctx.get_formatted("list").is_err());
    }

    #[test]
    fn test_escaped_braces() {
        let ctx = context(json!({"a": "{{literal}} {b}", "b": "x", "c": "{{b}}"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("{literal} x"));
        assert_eq!(ctx.get_formatted("c").unwrap(), json!("{b}"));
    }

    #[test]
    fn test_stray_braces_left_verbatim() {
        let ctx = context(json!({"a": "fn() {}", "b": "a } b"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("fn() {}"));
        assert_eq!(ctx.get_formatted("b").unwrap(), json!("a } b"));
    }

    #[test]
    fn test_null_embeds_as_empty() {
        let ctx = context(json!({"n": null, "a": "[{n}]"}));
        assert_eq!(ctx.get_formatted("a").unwrap(), json!("[]"));
    }

    #[test]
    fn test_shared_references_resolve_once() {
        let mut map = serde_json::Map::new();
        map.insert("k0".to_string(), json!({"a": 1, "b": 2}));
        for i in 1..=40 {
            map.insert(format!("p{i}"), json!(format!("{{k{}}}", i - 1)));
            map.insert(
                format!("k{i}"),
                json!({"a": format!("{{p{i}.a}}"), "b": format!("{{p{i}.b}}")}),
            );
        }
        let ctx = Context::from(map);

        assert_eq!(ctx.get_formatted("k40").unwrap(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_located_value_names_its_location() {
        let ctx = context(json!({"a": 1}));
        let location = [PathSegment::Key("step".into()), PathSegment::Index(2)];
        let err = Interpolator::new(&ctx)
            .format_located(&location, &json!("{a}-{gone}"))
            .unwrap_err();

        match err {
            ContextflowError::KeyNotFound(e) => {
                assert_eq!(e.key, "gone");
                assert_eq!(e.referenced_by.as_deref(), Some("step[2]"));
            }
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_format_anonymous_value() {
        let ctx = context(json!({"key2": "value2"}));
        let template = json!({"OUT1": "{key2}"});
        assert_eq!(ctx.format(&template).unwrap(), json!({"OUT1": "value2"}));
    }
}
