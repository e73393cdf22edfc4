//! Reading module descriptors from disk.
//!
//! A descriptor file is read once per invocation, parsed, and validated.
//! The returned [`ModuleDescriptor`] is immutable from then on.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::types::{ModuleDescriptor, ValidationError};

/// Errors that can occur when loading a descriptor file.
#[derive(Debug, Error)]
pub enum LoadError {
  /// Failed to read the descriptor file.
  #[error("failed to read descriptor: {0}")]
  Read(#[source] io::Error),

  /// Failed to parse the descriptor TOML.
  #[error("failed to parse descriptor: {0}")]
  Parse(#[source] toml::de::Error),

  /// The descriptor violates a local invariant.
  #[error(transparent)]
  Invalid(#[from] ValidationError),
}

/// Load and validate a descriptor from the given path.
///
/// Returns `Ok(None)` if the file doesn't exist, so callers can probe
/// candidate directories without racing a separate existence check.
pub fn load(path: &Path) -> Result<Option<ModuleDescriptor>, LoadError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(LoadError::Read(e)),
  };

  let descriptor = ModuleDescriptor::from_toml(&content).map_err(LoadError::Parse)?;
  descriptor.validate()?;

  Ok(Some(descriptor))
}
