//! Access to environment variables.

use crate::errors::EnvironmentError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt::Debug;

/// Read and write access to a set of environment variables.
pub trait Environment: Send + Sync + Debug {
    /// Returns the value of `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the variable is not set.
    fn get(&self, name: &str) -> Result<String, EnvironmentError>;

    /// Sets `name` to `value`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` or `InvalidValue` when the pair cannot be stored.
    fn set(&self, name: &str, value: &str) -> Result<(), EnvironmentError>;

    /// Removes `name`. Removing an unset variable is not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` when the name cannot be used.
    fn unset(&self, name: &str) -> Result<(), EnvironmentError>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl ProcessEnvironment {
    /// Creates a handle to the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn check_name(name: &str) -> Result<(), EnvironmentError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('=') {
        "name contains '='"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(EnvironmentError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn check_value(name: &str, value: &str) -> Result<(), EnvironmentError> {
    if value.contains('\0') {
        return Err(EnvironmentError::InvalidValue {
            name: name.to_string(),
            reason: "value contains a NUL byte".to_string(),
        });
    }
    Ok(())
}

impl Environment for ProcessEnvironment {
    fn get(&self, name: &str) -> Result<String, EnvironmentError> {
        check_name(name)?;
        std::env::var(name).map_err(|err| match err {
            std::env::VarError::NotPresent => EnvironmentError::not_found(name),
            std::env::VarError::NotUnicode(_) => EnvironmentError::InvalidValue {
                name: name.to_string(),
                reason: "value is not valid unicode".to_string(),
            },
        })
    }

    fn set(&self, name: &str, value: &str) -> Result<(), EnvironmentError> {
        check_name(name)?;
        check_value(name, value)?;
        std::env::set_var(name, value);
        Ok(())
    }

    fn unset(&self, name: &str) -> Result<(), EnvironmentError> {
        check_name(name)?;
        std::env::remove_var(name);
        Ok(())
    }
}

/// An environment held in memory, isolated from the process.
#[derive(Debug, Default)]
pub struct InMemoryEnvironment {
    vars: RwLock<IndexMap<String, String>>,
}

impl InMemoryEnvironment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment seeded with `vars`.
    pub fn with_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: RwLock::new(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Returns the current value of `name` without going through the trait.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<String> {
        self.vars.read().get(name).cloned()
    }

    /// Returns a copy of every variable.
    #[must_use]
    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.vars.read().clone()
    }
}

impl Environment for InMemoryEnvironment {
    fn get(&self, name: &str) -> Result<String, EnvironmentError> {
        self.var(name)
            .ok_or_else(|| EnvironmentError::not_found(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), EnvironmentError> {
        check_name(name)?;
        check_value(name, value)?;
        self.vars.write().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&self, name: &str) -> Result<(), EnvironmentError> {
        check_name(name)?;
        self.vars.write().shift_remove(name);
        Ok(())
    }
}
