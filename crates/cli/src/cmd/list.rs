//! Implementation of the `modlink list` command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, print_info};

use super::load_registry;

pub fn cmd_list(root: &Path, format: OutputFormat) -> Result<()> {
  let registry = load_registry(root);

  if format.is_json() {
    let descriptors: Vec<_> = registry.modules().map(|m| &m.descriptor).collect();
    println!(
      "{}",
      serde_json::to_string_pretty(&descriptors).context("Failed to serialize module list")?
    );
    return Ok(());
  }

  if registry.is_empty() {
    print_info(&format!("no module descriptors found under {}", root.display()));
    return Ok(());
  }

  for module in registry.modules() {
    let descriptor = &module.descriptor;
    println!(
      "{} ({} public, {} private)",
      descriptor.name,
      descriptor.public_dependencies.len(),
      descriptor.private_dependencies.len()
    );
  }

  Ok(())
}
