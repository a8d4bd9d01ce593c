//! The context store shared by every step of a pipeline run.

use super::path::{walk, KeyPath, PathSegment};
use super::value::{kind_name, to_text, Value, ValueShape};
use crate::errors::{ContextflowError, KeyNotFoundError, KeyWrongTypeError};
use crate::interpolation::Interpolator;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered, string-keyed store of formattable values.
///
/// Values are stored verbatim. Placeholders are resolved against the
/// current state of the whole store each time a value is read through
/// [`Context::get_formatted`], never when it is written.
///
/// A write to an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    data: IndexMap<String, Value>,
}

impl Context {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value bound to `key`.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<&Value, ContextflowError> {
        self.data
            .get(key)
            .ok_or_else(|| KeyNotFoundError::new(key).into())
    }

    /// Returns the raw value bound to `key`, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the raw value at a nested path such as `a.b[0].c`.
    ///
    /// A top-level key that matches `path` exactly wins over nested lookup.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` naming the full path if any segment is missing.
    pub fn get_path(&self, path: &str) -> Result<&Value, ContextflowError> {
        if let Some(value) = self.data.get(path) {
            return Ok(value);
        }
        KeyPath::parse(path)
            .and_then(|parsed| {
                self.data
                    .get(parsed.root())
                    .and_then(|root| walk(root, parsed.rest()))
            })
            .ok_or_else(|| KeyNotFoundError::new(path).into())
    }

    /// Binds `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Removes `key`, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Returns true if `key` is bound.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the value at `key` (or nested path) with every placeholder
    /// resolved against the current store.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key or any referenced key is absent, and
    /// `InterpolationCycle` if a placeholder chain revisits itself.
    pub fn get_formatted(&self, key: &str) -> Result<Value, ContextflowError> {
        Interpolator::new(self).resolve(key)
    }

    /// Resolves `key` and renders the result as text.
    ///
    /// # Errors
    ///
    /// As [`Context::get_formatted`], plus `KeyWrongType` if the resolved
    /// value is a sequence or mapping.
    pub fn get_formatted_string(&self, key: &str) -> Result<String, ContextflowError> {
        let value = self.get_formatted(key)?;
        if value.is_array() || value.is_object() {
            return Err(KeyWrongTypeError::new(key, ValueShape::String, kind_name(&value)).into());
        }
        Ok(to_text(&value))
    }

    /// Resolves every placeholder in an arbitrary value against the store.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` or `InterpolationCycle` as for
    /// [`Context::get_formatted`].
    pub fn format(&self, value: &Value) -> Result<Value, ContextflowError> {
        Interpolator::new(self).format(value)
    }

    /// Resolves every placeholder in `value`, attributing failures to
    /// `location` (for example `envSet.OUT` or `tarExtract[1].in`).
    ///
    /// # Errors
    ///
    /// As [`Context::format`]. A `KeyNotFound` names `location` as the
    /// referencing key.
    pub fn format_at(
        &self,
        location: &[PathSegment],
        value: &Value,
    ) -> Result<Value, ContextflowError> {
        Interpolator::new(self).format_located(location, value)
    }

    /// Resolves every placeholder in a template string against the store.
    ///
    /// # Errors
    ///
    /// As [`Context::format`].
    pub fn format_str(&self, template: &str) -> Result<Value, ContextflowError> {
        self.format(&Value::String(template.to_string()))
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Iterates over raw entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the store, returning the underlying map.
    #[must_use]
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.data
    }

    /// Returns the store as a JSON mapping.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl Extend<(String, Value)> for Context {
    fn extend<T: IntoIterator<Item = (String, Value)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut context = Self::new();
        context.extend(iter);
        context
    }
}

impl From<IndexMap<String, Value>> for Context {
    fn from(data: IndexMap<String, Value>) -> Self {
        Self { data }
    }
}

impl From<serde_json::Map<String, Value>> for Context {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Context {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
