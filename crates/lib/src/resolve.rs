//! Effective surface resolution and build planning.
//!
//! Resolution turns a registry of declarative descriptors into a
//! [`BuildPlan`]: a topological build order, parallel waves, and the
//! effective compile/link surface of every module.
//!
//! # Visibility rules
//!
//! - A module *exports* its own public include paths plus the exports of its
//!   public dependencies. Exports propagate transitively along public edges.
//! - A module *sees* its own paths (public and private) plus the exports of
//!   every direct dependency. A private dependency is fully visible to the
//!   declaring module but contributes nothing to its exports.
//! - A module *links* its direct dependencies plus the transitive closure of
//!   their public edges.
//!
//! Resolution is a single synchronous pass. Any unresolved dependency or
//! cycle aborts the whole plan; no partial plan is produced.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{DependencyGraph, GraphError};
use crate::registry::ModuleRegistry;

/// Effective surfaces of one module after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
  /// The module's name.
  pub name: String,

  /// Include directories visible while building this module.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include_dirs: Vec<PathBuf>,

  /// Include directories this module exposes to its consumers.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub exported_include_dirs: Vec<PathBuf>,

  /// Modules linked into this module's build unit, in sorted order.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub link_dependencies: Vec<String>,
}

/// The finished build plan for a registry.
///
/// This is the artifact the orchestrator hands to a compiler/linker
/// toolchain; producing it is where this library's responsibility ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
  /// Topological build order, dependencies before dependents.
  pub order: Vec<String>,

  /// Parallel build waves; every module of a wave may build concurrently.
  pub waves: Vec<Vec<String>>,

  /// Resolved surfaces, keyed by module name.
  pub modules: BTreeMap<String, ResolvedModule>,
}

impl BuildPlan {
  /// Look up a resolved module by name.
  pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
    self.modules.get(name)
  }

  /// Number of modules in the plan.
  pub fn len(&self) -> usize {
    self.modules.len()
  }

  /// Check whether the plan is empty.
  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}

/// Resolve a registry into a [`BuildPlan`].
///
/// # Errors
///
/// Returns [`GraphError`] if a dependency name does not resolve or the
/// graph contains a cycle. Both are fatal: the error carries the diagnostic
/// and no plan is emitted.
pub fn resolve(registry: &ModuleRegistry) -> Result<BuildPlan, GraphError> {
  let graph = DependencyGraph::from_registry(registry)?;
  let order = graph.build_order()?;
  let waves = graph.build_waves()?;

  info!(modules = order.len(), waves = waves.len(), "resolving module surfaces");

  // Exports and public link closures, computed in topological order so each
  // module's surface is final before any dependent reads it.
  let mut exports: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
  let mut public_closure: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

  for name in &order {
    let Some(module) = registry.get(name) else {
      continue;
    };

    let mut exported = module.public_include_dirs();
    let mut closure = BTreeSet::new();
    closure.insert(name.clone());

    for dep in &module.descriptor.public_dependencies {
      if let Some(dep_exports) = exports.get(dep) {
        exported.extend(dep_exports.iter().cloned());
      }
      if let Some(dep_closure) = public_closure.get(dep) {
        closure.extend(dep_closure.iter().cloned());
      }
    }

    exports.insert(name.clone(), dedupe(exported));
    public_closure.insert(name.clone(), closure);
  }

  let mut modules = BTreeMap::new();

  for name in &order {
    let Some(module) = registry.get(name) else {
      continue;
    };

    // Compile surface: own paths plus the exports of every direct
    // dependency, public and private alike.
    let mut include_dirs = module.public_include_dirs();
    include_dirs.extend(module.private_include_dirs());

    let mut link: BTreeSet<String> = BTreeSet::new();

    for (dep, _) in module.descriptor.dependencies() {
      if let Some(dep_exports) = exports.get(dep) {
        include_dirs.extend(dep_exports.iter().cloned());
      }
      if let Some(dep_closure) = public_closure.get(dep) {
        link.extend(dep_closure.iter().cloned());
      }
    }

    let resolved = ResolvedModule {
      name: name.clone(),
      include_dirs: dedupe(include_dirs),
      exported_include_dirs: exports.get(name).cloned().unwrap_or_default(),
      link_dependencies: link.into_iter().collect(),
    };

    debug!(
      module = %name,
      includes = resolved.include_dirs.len(),
      links = resolved.link_dependencies.len(),
      "resolved"
    );

    modules.insert(name.clone(), resolved);
  }

  Ok(BuildPlan { order, waves, modules })
}

/// Remove duplicate paths while preserving first-seen order.
fn dedupe(paths: Vec<PathBuf>) -> Vec<PathBuf> {
  let mut seen = HashSet::new();
  paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;

  use crate::descriptor::ModuleDescriptor;
  use crate::registry::RegisteredModule;

  fn module(name: &str, public_deps: &[&str], private_deps: &[&str]) -> RegisteredModule {
    let mut descriptor = ModuleDescriptor::new(name);
    descriptor.public_include_paths = vec![PathBuf::from("Public")];
    descriptor.public_dependencies = public_deps.iter().map(|s| s.to_string()).collect();
    descriptor.private_dependencies = private_deps.iter().map(|s| s.to_string()).collect();
    RegisteredModule::new(descriptor, format!("/proj/{}", name))
  }

  fn registry_of(modules: Vec<RegisteredModule>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for m in modules {
      registry.insert(m).unwrap();
    }
    registry
  }

  fn public_dir(name: &str) -> PathBuf {
    Path::new("/proj").join(name).join("Public")
  }

  mod surfaces {
    use super::*;

    #[test]
    fn public_dependency_exports_transitively() {
      // SharedFile -> Engine (public) -> Core (public): any consumer of
      // SharedFile must observe Core's public include paths.
      let registry = registry_of(vec![
        module("Core", &[], &[]),
        module("Engine", &["Core"], &[]),
        module("SharedFile", &["Engine"], &[]),
      ]);

      let plan = resolve(&registry).unwrap();
      let shared = plan.module("SharedFile").unwrap();

      assert!(shared.include_dirs.contains(&public_dir("Core")));
      assert!(shared.exported_include_dirs.contains(&public_dir("Core")));
      assert!(shared.exported_include_dirs.contains(&public_dir("Engine")));
    }

    #[test]
    fn private_dependency_is_not_exported() {
      // SharedFile -> DeviceSdk (private): SharedFile itself sees the SDK,
      // its consumers do not.
      let registry = registry_of(vec![
        module("DeviceSdk", &[], &[]),
        module("SharedFile", &[], &["DeviceSdk"]),
        module("App", &["SharedFile"], &[]),
      ]);

      let plan = resolve(&registry).unwrap();

      let shared = plan.module("SharedFile").unwrap();
      assert!(shared.include_dirs.contains(&public_dir("DeviceSdk")));
      assert!(!shared.exported_include_dirs.contains(&public_dir("DeviceSdk")));

      let app = plan.module("App").unwrap();
      assert!(!app.include_dirs.contains(&public_dir("DeviceSdk")));
      assert!(!app.link_dependencies.contains(&"DeviceSdk".to_string()));
    }

    #[test]
    fn private_dependency_links_into_declaring_module() {
      // {name: "X", private: ["Core"]} against a registry containing Core.
      let registry = registry_of(vec![module("Core", &[], &[]), module("X", &[], &["Core"])]);

      let plan = resolve(&registry).unwrap();
      let x = plan.module("X").unwrap();

      assert_eq!(x.link_dependencies, vec!["Core".to_string()]);
    }

    #[test]
    fn link_closure_follows_public_edges() {
      // Linking SharedFile pulls in Engine and, through Engine's public
      // edge, Core.
      let registry = registry_of(vec![
        module("Core", &[], &[]),
        module("Engine", &["Core"], &[]),
        module("SharedFile", &["Engine"], &[]),
      ]);

      let plan = resolve(&registry).unwrap();
      let shared = plan.module("SharedFile").unwrap();

      assert_eq!(
        shared.link_dependencies,
        vec!["Core".to_string(), "Engine".to_string()]
      );
    }

    #[test]
    fn link_closure_stops_at_private_edges() {
      // Engine's private dependency stays out of SharedFile's link set.
      let registry = registry_of(vec![
        module("Settings", &[], &[]),
        module("Engine", &[], &["Settings"]),
        module("SharedFile", &["Engine"], &[]),
      ]);

      let plan = resolve(&registry).unwrap();
      let shared = plan.module("SharedFile").unwrap();

      assert_eq!(shared.link_dependencies, vec!["Engine".to_string()]);
    }

    #[test]
    fn own_private_paths_stay_private() {
      let mut shared = module("SharedFile", &[], &[]);
      shared.descriptor.private_include_paths = vec![PathBuf::from("Private")];

      let registry = registry_of(vec![shared, module("App", &["SharedFile"], &[])]);
      let plan = resolve(&registry).unwrap();

      let private_dir = PathBuf::from("/proj/SharedFile/Private");
      assert!(plan.module("SharedFile").unwrap().include_dirs.contains(&private_dir));
      assert!(!plan.module("App").unwrap().include_dirs.contains(&private_dir));
    }

    #[test]
    fn shared_dependency_appears_once() {
      // Diamond: Top reaches Core through both Left and Right.
      let registry = registry_of(vec![
        module("Core", &[], &[]),
        module("Left", &["Core"], &[]),
        module("Right", &["Core"], &[]),
        module("Top", &["Left", "Right"], &[]),
      ]);

      let plan = resolve(&registry).unwrap();
      let top = plan.module("Top").unwrap();

      let core_dirs = top.include_dirs.iter().filter(|d| **d == public_dir("Core")).count();
      assert_eq!(core_dirs, 1);
      assert_eq!(
        top.link_dependencies,
        vec!["Core".to_string(), "Left".to_string(), "Right".to_string()]
      );
    }
  }

  mod failures {
    use super::*;

    #[test]
    fn unresolved_dependency_emits_no_plan() {
      let registry = registry_of(vec![module("SharedFile", &["Foo"], &[])]);

      let result = resolve(&registry);

      assert!(matches!(
        result,
        Err(GraphError::UnresolvedDependency { module, dependency })
          if module == "SharedFile" && dependency == "Foo"
      ));
    }

    #[test]
    fn cycle_emits_no_plan() {
      let registry = registry_of(vec![module("A", &["B"], &[]), module("B", &["A"], &[])]);

      assert!(matches!(resolve(&registry), Err(GraphError::CycleDetected { .. })));
    }
  }

  mod plan {
    use super::*;

    #[test]
    fn order_and_waves_cover_all_modules() {
      let registry = registry_of(vec![
        module("Core", &[], &[]),
        module("Engine", &["Core"], &[]),
        module("SharedFile", &["Engine"], &["Core"]),
      ]);

      let plan = resolve(&registry).unwrap();

      assert_eq!(plan.len(), 3);
      assert_eq!(plan.order.len(), 3);
      assert_eq!(plan.waves.iter().map(|w| w.len()).sum::<usize>(), 3);
    }

    #[test]
    fn json_round_trip() {
      let registry = registry_of(vec![module("Core", &[], &[]), module("X", &[], &["Core"])]);
      let plan = resolve(&registry).unwrap();

      let json = serde_json::to_string_pretty(&plan).unwrap();
      let reparsed: BuildPlan = serde_json::from_str(&json).unwrap();

      assert_eq!(plan, reparsed);
    }

    #[test]
    fn empty_registry_resolves_to_empty_plan() {
      let plan = resolve(&ModuleRegistry::new()).unwrap();
      assert!(plan.is_empty());
      assert!(plan.order.is_empty());
      assert!(plan.waves.is_empty());
    }
  }
}
