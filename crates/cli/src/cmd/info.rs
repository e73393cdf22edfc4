//! Implementation of the `modlink info` command.
//!
//! Shows one module's declaration alongside its resolved surfaces and its
//! place in the graph (direct dependencies and dependents).

use std::path::Path;

use anyhow::{Context, Result};
use modlink_lib::descriptor::Visibility;
use modlink_lib::graph::DependencyGraph;

use crate::output::{OutputFormat, print_error, print_stat};

use super::{load_registry, resolve_or_exit};

pub fn cmd_info(root: &Path, name: &str, format: OutputFormat) -> Result<()> {
  let registry = load_registry(root);

  let Some(module) = registry.get(name) else {
    print_error(&format!("module '{}' is not registered under {}", name, root.display()));
    std::process::exit(1);
  };

  let plan = resolve_or_exit(&registry);
  let graph = match DependencyGraph::from_registry(&registry) {
    Ok(graph) => graph,
    Err(e) => {
      print_error(&e.to_string());
      std::process::exit(1);
    }
  };

  let Some(resolved) = plan.module(name) else {
    print_error(&format!("module '{}' missing from plan", name));
    std::process::exit(1);
  };

  if format.is_json() {
    let value = serde_json::json!({
      "descriptor": module.descriptor,
      "dir": module.dir,
      "resolved": resolved,
    });
    println!("{}", serde_json::to_string_pretty(&value).context("Failed to serialize module info")?);
    return Ok(());
  }

  println!("{}", name);
  print_stat("dir", &module.dir.display().to_string());

  print_stat("depends on", &render_edges(&graph.dependencies_of(name)));
  print_stat("required by", &render_edges(&graph.dependents_of(name)));

  println!();
  println!("Include dirs:");
  for dir in &resolved.include_dirs {
    println!("  {}", dir.display());
  }

  println!("Exported include dirs:");
  for dir in &resolved.exported_include_dirs {
    println!("  {}", dir.display());
  }

  println!("Link dependencies:");
  for dep in &resolved.link_dependencies {
    println!("  {}", dep);
  }

  Ok(())
}

fn render_edges(edges: &[(String, Visibility)]) -> String {
  if edges.is_empty() {
    return "(none)".to_string();
  }

  edges
    .iter()
    .map(|(name, visibility)| match visibility {
      Visibility::Public => name.clone(),
      Visibility::Private => format!("{} (private)", name),
    })
    .collect::<Vec<_>>()
    .join(", ")
}
