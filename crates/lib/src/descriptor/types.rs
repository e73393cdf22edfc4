//! Module descriptor types.
//!
//! This module defines [`ModuleDescriptor`], the declarative record each
//! module contributes to the build graph:
//! - include paths it exposes to dependents (public) or keeps to itself (private)
//! - dependency module names, split by visibility
//!
//! Descriptors serialize to and from TOML. Serialization is round-trip
//! stable: parsing the serialized form of a valid descriptor yields an
//! identical descriptor.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of a module descriptor within its module directory.
pub const DESCRIPTOR_FILENAME: &str = "module.toml";

/// Visibility of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  /// The dependency's interface is re-exported to consumers of the
  /// declaring module.
  Public,
  /// The dependency is visible only within the declaring module's own
  /// build unit.
  Private,
}

/// A module's declaration to the build orchestrator.
///
/// ```toml
/// name = "SharedFile"
/// public_include_paths = ["Public"]
/// private_include_paths = ["Private"]
/// public_dependencies = ["Core", "CoreObject", "Engine"]
/// private_dependencies = ["RuntimeSettings", "DeviceSdk"]
/// ```
///
/// Include paths are stored as declared (relative to the module directory);
/// they are resolved to absolute directories when the module is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
  /// Unique module name within the build graph.
  pub name: String,

  /// Include paths exposed transitively to dependents.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub public_include_paths: Vec<PathBuf>,

  /// Include paths visible only while building this module.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub private_include_paths: Vec<PathBuf>,

  /// Modules whose interface this module re-exports to its consumers.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub public_dependencies: Vec<String>,

  /// Modules visible only within this module's own compilation.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub private_dependencies: Vec<String>,
}

/// Errors from descriptor-local validation.
#[derive(Debug, Error)]
pub enum ValidationError {
  /// The descriptor declares an empty module name.
  #[error("module name must not be empty")]
  EmptyName,

  /// A module lists itself as a dependency.
  #[error("module '{name}' depends on itself")]
  SelfDependency { name: String },

  /// A dependency name appears more than once (within a list, or in both
  /// the public and the private list).
  #[error("module '{name}' declares dependency '{dependency}' more than once")]
  DuplicateDependency { name: String, dependency: String },
}

impl ModuleDescriptor {
  /// Create a descriptor with the given name and no paths or dependencies.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      public_include_paths: Vec::new(),
      private_include_paths: Vec::new(),
      public_dependencies: Vec::new(),
      private_dependencies: Vec::new(),
    }
  }

  /// Parse a descriptor from TOML text.
  pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(text)
  }

  /// Serialize the descriptor to TOML text.
  pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(self)
  }

  /// Iterate all dependency edges, public first, each with its visibility.
  pub fn dependencies(&self) -> impl Iterator<Item = (&str, Visibility)> {
    self
      .public_dependencies
      .iter()
      .map(|d| (d.as_str(), Visibility::Public))
      .chain(
        self
          .private_dependencies
          .iter()
          .map(|d| (d.as_str(), Visibility::Private)),
      )
  }

  /// Check whether this module declares an edge to `name`.
  pub fn depends_on(&self, name: &str) -> bool {
    self.dependencies().any(|(dep, _)| dep == name)
  }

  /// Validate descriptor-local invariants.
  ///
  /// Cross-module invariants (name uniqueness, edge resolution, acyclicity)
  /// are enforced by the registry and the dependency graph.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.is_empty() {
      return Err(ValidationError::EmptyName);
    }

    let mut seen = BTreeSet::new();
    for (dep, _) in self.dependencies() {
      if dep == self.name {
        return Err(ValidationError::SelfDependency {
          name: self.name.clone(),
        });
      }
      if !seen.insert(dep) {
        return Err(ValidationError::DuplicateDependency {
          name: self.name.clone(),
          dependency: dep.to_string(),
        });
      }
    }

    Ok(())
  }
}
