//! Module registry: discovery and lookup of registered modules.
//!
//! The registry is the orchestrator's view of every module declared under a
//! project root. It is built once per invocation by scanning for descriptor
//! files, enforces name uniqueness, and is read-only afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::descriptor::load::{self, LoadError};
use crate::descriptor::{DESCRIPTOR_FILENAME, ModuleDescriptor};

/// A descriptor together with the directory it was loaded from.
///
/// Include paths in the descriptor are declared relative to this directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredModule {
  /// The parsed, validated descriptor.
  pub descriptor: ModuleDescriptor,

  /// Absolute path of the module directory.
  pub dir: PathBuf,
}

impl RegisteredModule {
  /// Create a registered module rooted at `dir`.
  pub fn new(descriptor: ModuleDescriptor, dir: impl Into<PathBuf>) -> Self {
    Self {
      descriptor,
      dir: dir.into(),
    }
  }

  /// The module's name.
  pub fn name(&self) -> &str {
    &self.descriptor.name
  }

  /// Public include paths resolved against the module directory.
  pub fn public_include_dirs(&self) -> Vec<PathBuf> {
    self
      .descriptor
      .public_include_paths
      .iter()
      .map(|p| self.dir.join(p))
      .collect()
  }

  /// Private include paths resolved against the module directory.
  pub fn private_include_dirs(&self) -> Vec<PathBuf> {
    self
      .descriptor
      .private_include_paths
      .iter()
      .map(|p| self.dir.join(p))
      .collect()
  }
}

/// Errors that can occur while building the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// Failed to walk the project root.
  #[error("failed to scan '{}': {source}", root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// A descriptor file failed to load.
  #[error("failed to load '{}': {source}", path.display())]
  Load {
    path: PathBuf,
    #[source]
    source: LoadError,
  },

  /// Two descriptors declare the same module name.
  #[error("duplicate module '{name}' declared in '{}' and '{}'", first.display(), second.display())]
  DuplicateModule {
    name: String,
    first: PathBuf,
    second: PathBuf,
  },
}

/// All modules known to the build orchestrator, keyed by name.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
  modules: BTreeMap<String, RegisteredModule>,
}

impl ModuleRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a registry by scanning `root` for descriptor files.
  ///
  /// Every `module.toml` found under the root registers one module; the
  /// file's parent directory becomes the module directory.
  ///
  /// # Errors
  ///
  /// Returns [`RegistryError`] if the walk fails, a descriptor fails to
  /// load or validate, or two modules share a name.
  pub fn discover(root: &Path) -> Result<Self, RegistryError> {
    let mut registry = Self::new();

    info!(root = %root.display(), "scanning for module descriptors");

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
      let entry = entry.map_err(|e| RegistryError::Walk {
        root: root.to_path_buf(),
        source: e,
      })?;

      if !entry.file_type().is_file() || entry.file_name() != DESCRIPTOR_FILENAME {
        continue;
      }

      let path = entry.path();
      // None here means the file vanished between the walk and the read.
      let Some(descriptor) = load::load(path).map_err(|e| RegistryError::Load {
        path: path.to_path_buf(),
        source: e,
      })?
      else {
        continue;
      };

      let dir = path.parent().unwrap_or(root).to_path_buf();
      debug!(name = %descriptor.name, dir = %dir.display(), "registering module");

      registry.insert(RegisteredModule::new(descriptor, dir))?;
    }

    info!(count = registry.len(), "registry built");
    Ok(registry)
  }

  /// Register a module, rejecting duplicate names.
  pub fn insert(&mut self, module: RegisteredModule) -> Result<(), RegistryError> {
    let name = module.name().to_string();

    if let Some(existing) = self.modules.get(&name) {
      return Err(RegistryError::DuplicateModule {
        name,
        first: existing.dir.clone(),
        second: module.dir,
      });
    }

    self.modules.insert(name, module);
    Ok(())
  }

  /// Look up a module by name.
  pub fn get(&self, name: &str) -> Option<&RegisteredModule> {
    self.modules.get(name)
  }

  /// Check whether a module name is registered.
  pub fn contains(&self, name: &str) -> bool {
    self.modules.contains_key(name)
  }

  /// All registered names, in sorted order.
  pub fn names(&self) -> Vec<&str> {
    self.modules.keys().map(|s| s.as_str()).collect()
  }

  /// Iterate registered modules in name order.
  pub fn modules(&self) -> impl Iterator<Item = &RegisteredModule> {
    self.modules.values()
  }

  /// Number of registered modules.
  pub fn len(&self) -> usize {
    self.modules.len()
  }

  /// Check whether the registry is empty.
  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}
