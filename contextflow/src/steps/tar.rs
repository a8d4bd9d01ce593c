//! The `tar` step: extract and create tar archives.
//!
//! `tarExtract` and `tarArchive` are each a sequence of `{in, out}`
//! mappings. Extraction runs before archiving. `tarFormat` picks the
//! compression:
//!
//! | `tarFormat` | read mode | write mode |
//! |-------------|-----------|------------|
//! | absent      | `r:*`     | `w:xz`     |
//! | null        | `r:*`     | `w:xz`     |
//! | `""`        | `r:`      | `w:`       |
//! | `gz`        | `r:gz`    | `w:gz`     |

use super::archive::{Archiver, TarArchiver};
use super::dispatch::SubOperation;
use super::Step;
use crate::context::{kind_name, to_text, Context, PathSegment, Value, ValueShape};
use crate::errors::{ContextflowError, KeyNotFoundError, KeyWrongTypeError};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Step name used in messages and in the registry.
pub const STEP_NAME: &str = "tar";
/// Enables [`tar_extract`].
pub const TAR_EXTRACT: &str = "tarExtract";
/// Enables [`tar_archive`].
pub const TAR_ARCHIVE: &str = "tarArchive";
/// Selects the compression scheme.
pub const TAR_FORMAT: &str = "tarFormat";

const DEFAULT_READ_SCHEME: &str = "*";
const DEFAULT_WRITE_SCHEME: &str = "xz";

/// Extracts and creates tar archives.
#[derive(Debug, Clone)]
pub struct TarStep {
    archiver: Arc<dyn Archiver>,
}

impl TarStep {
    /// Creates the step over `archiver`.
    #[must_use]
    pub fn new(archiver: Arc<dyn Archiver>) -> Self {
        Self { archiver }
    }
}

impl Default for TarStep {
    fn default() -> Self {
        Self::new(Arc::new(TarArchiver::new()))
    }
}

impl Step for TarStep {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn operations(&self) -> Vec<SubOperation<'_>> {
        let archiver = self.archiver.as_ref();
        vec![
            SubOperation::new(TAR_EXTRACT, ValueShape::SequenceOfMappings, move |ctx| {
                tar_extract(ctx, archiver)
            }),
            SubOperation::new(TAR_ARCHIVE, ValueShape::SequenceOfMappings, move |ctx| {
                tar_archive(ctx, archiver)
            }),
        ]
    }
}

/// Returns the mode string to read archives with.
///
/// # Errors
///
/// Returns any error from resolving `tarFormat`.
pub fn file_mode_for_reading(context: &Context) -> Result<String, ContextflowError> {
    file_mode(context, "r", DEFAULT_READ_SCHEME)
}

/// Returns the mode string to write archives with.
///
/// # Errors
///
/// Returns any error from resolving `tarFormat`.
pub fn file_mode_for_writing(context: &Context) -> Result<String, ContextflowError> {
    file_mode(context, "w", DEFAULT_WRITE_SCHEME)
}

fn file_mode(
    context: &Context,
    direction: &str,
    default: &str,
) -> Result<String, ContextflowError> {
    let scheme = match context.value(TAR_FORMAT) {
        Some(raw) if !raw.is_null() => to_text(&context.get_formatted(TAR_FORMAT)?),
        _ => default.to_string(),
    };
    Ok(format!("{direction}:{scheme}"))
}

/// Extracts each `in` archive into the `out` directory.
///
/// # Errors
///
/// Returns `KeyNotFound` for a missing `in`/`out` entry, or any
/// interpolation or archive error.
pub fn tar_extract(context: &Context, archiver: &dyn Archiver) -> Result<(), ContextflowError> {
    for (index, entry) in entries(context, TAR_EXTRACT)?.iter().enumerate() {
        let mode = file_mode_for_reading(context)?;
        let archive = endpoint(context, TAR_EXTRACT, index, entry, "in")?;
        let destination = endpoint(context, TAR_EXTRACT, index, entry, "out")?;
        info!(%archive, %destination, %mode, "extracting tar archive");
        archiver.extract(Path::new(&archive), Path::new(&destination), &mode)?;
    }
    Ok(())
}

/// Archives each `in` directory into the `out` archive.
///
/// # Errors
///
/// Returns `KeyNotFound` for a missing `in`/`out` entry, or any
/// interpolation or archive error.
pub fn tar_archive(context: &Context, archiver: &dyn Archiver) -> Result<(), ContextflowError> {
    for (index, entry) in entries(context, TAR_ARCHIVE)?.iter().enumerate() {
        let mode = file_mode_for_writing(context)?;
        let source = endpoint(context, TAR_ARCHIVE, index, entry, "in")?;
        let archive = endpoint(context, TAR_ARCHIVE, index, entry, "out")?;
        info!(%source, %archive, %mode, "writing tar archive");
        archiver.archive(Path::new(&source), Path::new(&archive), &mode)?;
    }
    Ok(())
}

fn entries<'c>(context: &'c Context, key: &str) -> Result<&'c [Value], ContextflowError> {
    match context.get(key)? {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(
            KeyWrongTypeError::new(key, ValueShape::SequenceOfMappings, kind_name(other)).into(),
        ),
    }
}

fn endpoint(
    context: &Context,
    key: &str,
    index: usize,
    entry: &Value,
    field: &str,
) -> Result<String, ContextflowError> {
    let raw = entry
        .get(field)
        .ok_or_else(|| KeyNotFoundError::new(format!("{key}[{index}].{field}")))?;
    let location = [
        PathSegment::Key(key.to_string()),
        PathSegment::Index(index),
        PathSegment::Key(field.to_string()),
    ];
    Ok(to_text(&context.format_at(&location, raw)?))
}
