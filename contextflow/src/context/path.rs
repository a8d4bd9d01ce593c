//! Nested key addressing: `a.b.c`, `a[0].b`, `a.0.b`.

use super::Value;
use std::fmt;

/// One step into a composite value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key. Numeric keys also index sequences.
    Key(String),
    /// A sequence index written in brackets.
    Index(usize),
}

impl PathSegment {
    /// Looks up this segment in `value`.
    ///
    /// Returns the child together with the segment normalised to the
    /// container it was found in, so equal locations compare equal.
    #[must_use]
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<(&'v Value, PathSegment)> {
        match (self, value) {
            (Self::Key(key), Value::Object(map)) => {
                map.get(key).map(|child| (child, self.clone()))
            }
            (Self::Key(key), Value::Array(items)) => {
                let index = key.parse::<usize>().ok()?;
                items.get(index).map(|child| (child, Self::Index(index)))
            }
            (Self::Index(index), Value::Array(items)) => {
                items.get(*index).map(|child| (child, self.clone()))
            }
            (Self::Index(index), Value::Object(map)) => {
                let key = index.to_string();
                map.get(&key).map(|child| (child, Self::Key(key)))
            }
            _ => None,
        }
    }
}

/// A parsed key path. The first segment is always a top-level key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// Parses a path. Returns `None` for an empty path, an empty or
    /// unterminated bracket, or a path that starts with a bracket.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();

        while let Some(character) = chars.next() {
            match character {
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                    if segments.is_empty() {
                        return None;
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(next);
                    }
                    let inner = inner.trim().trim_matches(|c| c == '\'' || c == '"');
                    if !closed || inner.is_empty() {
                        return None;
                    }
                    segments.push(match inner.parse::<usize>() {
                        Ok(index) => PathSegment::Index(index),
                        Err(_) => PathSegment::Key(inner.to_string()),
                    });
                }
                _ => current.push(character),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        }
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The top-level key.
    #[must_use]
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => key,
            _ => &self.raw,
        }
    }

    /// The segments after the top-level key.
    #[must_use]
    pub fn rest(&self) -> &[PathSegment] {
        self.segments.get(1..).unwrap_or_default()
    }

    /// All segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walks `segments` into an already concrete value.
#[must_use]
pub fn walk<'v>(value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| segment.lookup(current).map(|(child, _)| child))
}

/// Renders segments as `a.b[0].c`.
#[must_use]
pub fn render(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_parse_dotted() {
        let path = KeyPath::parse("a.b.c").unwrap();
        assert_eq!(path.root(), "a");
        assert_eq!(path.rest(), &[key("b"), key("c")]);
    }

    #[test]
    fn test_parse_brackets() {
        let path = KeyPath::parse("a[0].b['x y']").unwrap();
        assert_eq!(
            path.segments(),
            &[key("a"), PathSegment::Index(0), key("b"), key("x y")]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(KeyPath::parse("").is_none());
        assert!(KeyPath::parse("...").is_none());
        assert!(KeyPath::parse("a[0").is_none());
        assert!(KeyPath::parse("a[]").is_none());
        assert!(KeyPath::parse("[0]").is_none());
    }

    #[test]
    fn test_walk_mixed() {
        let value = json!({"items": [{"id": 7}, {"id": 9}]});
        let path = KeyPath::parse("items[1].id").unwrap();
        assert_eq!(walk(&value, &path.segments()[..]), Some(&json!(9)));

        let path = KeyPath::parse("items.0.id").unwrap();
        assert_eq!(walk(&value, path.segments()), Some(&json!(7)));

        let path = KeyPath::parse("items.2.id").unwrap();
        assert_eq!(walk(&value, path.segments()), None);
    }

    #[test]
    fn test_lookup_normalises_numeric_keys() {
        let value = json!(["x"]);
        let (child, seg) = key("0").lookup(&value).unwrap();
        assert_eq!(child, &json!("x"));
        assert_eq!(seg, PathSegment::Index(0));
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&[key("a"), PathSegment::Index(2), key("b")]), "a[2].b");
    }
}
