//! Mock steps and collaborators for testing.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::context::{Context, Value};
use crate::errors::{ArchiveError, ContextflowError, ContractViolationError};
use crate::steps::{Archiver, Step};

/// A mock step that counts calls and writes fixed outputs.
#[derive(Debug)]
pub struct MockStep {
    name: String,
    outputs: Vec<(String, Value)>,
    call_count: Mutex<usize>,
}

impl MockStep {
    /// Creates a new mock step that writes nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: Vec::new(),
            call_count: Mutex::new(0),
        }
    }

    /// Adds an output the step writes on every call.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.push((key.into(), value.into()));
        self
    }

    /// Returns the number of times the step was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

impl Step for MockStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, context: &mut Context) -> Result<(), ContextflowError> {
        *self.call_count.lock() += 1;
        for (key, value) in &self.outputs {
            context.set(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// A step that always fails with a contract violation.
#[derive(Debug)]
pub struct FailingStep {
    name: String,
    message: String,
}

impl FailingStep {
    /// Creates a new failing step.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl Step for FailingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _context: &mut Context) -> Result<(), ContextflowError> {
        Err(ContractViolationError::new(self.message.clone())
            .with_step(self.name.clone())
            .into())
    }
}

/// A step that records the context it was handed on every call.
#[derive(Debug)]
pub struct RecordingStep {
    name: String,
    seen: Mutex<Vec<Context>>,
}

impl RecordingStep {
    /// Creates a new recording step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every context seen, oldest first.
    #[must_use]
    pub fn seen(&self) -> Vec<Context> {
        self.seen.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, context: &mut Context) -> Result<(), ContextflowError> {
        self.seen.lock().push(context.clone());
        Ok(())
    }
}

/// A call made to a [`RecordingArchiver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveCall {
    /// An extraction request.
    Extract {
        /// The archive read.
        archive: PathBuf,
        /// The directory written.
        destination: PathBuf,
        /// The mode string passed.
        mode: String,
    },
    /// An archive request.
    Archive {
        /// The directory read.
        source: PathBuf,
        /// The archive written.
        archive: PathBuf,
        /// The mode string passed.
        mode: String,
    },
}

/// An [`Archiver`] that records calls without touching the filesystem.
#[derive(Debug, Default)]
pub struct RecordingArchiver {
    calls: Mutex<Vec<ArchiveCall>>,
    fail_on: Option<PathBuf>,
}

impl RecordingArchiver {
    /// Creates an archiver that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an archiver that fails any call naming `archive`.
    #[must_use]
    pub fn failing_on(archive: impl Into<PathBuf>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(archive.into()),
        }
    }

    /// Returns the calls made, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ArchiveCall> {
        self.calls.lock().clone()
    }

    fn check(&self, archive: &Path) -> Result<(), ArchiveError> {
        match &self.fail_on {
            Some(broken) if broken == archive => Err(ArchiveError::io(
                archive.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt archive"),
            )),
            _ => Ok(()),
        }
    }
}

impl Archiver for RecordingArchiver {
    fn extract(&self, archive: &Path, destination: &Path, mode: &str) -> Result<(), ArchiveError> {
        self.check(archive)?;
        self.calls.lock().push(ArchiveCall::Extract {
            archive: archive.to_path_buf(),
            destination: destination.to_path_buf(),
            mode: mode.to_string(),
        });
        Ok(())
    }

    fn archive(&self, source: &Path, archive: &Path, mode: &str) -> Result<(), ArchiveError> {
        self.check(archive)?;
        self.calls.lock().push(ArchiveCall::Archive {
            source: source.to_path_buf(),
            archive: archive.to_path_buf(),
            mode: mode.to_string(),
        });
        Ok(())
    }
}
