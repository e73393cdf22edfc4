//! Implementation of the `modlink check` command.
//!
//! Validates every descriptor under the root and the dependency graph they
//! form. Any failure is fatal and reported as a configuration error.

use std::path::Path;

use anyhow::Result;

use crate::output::{print_info, print_success};

use super::{load_registry, resolve_or_exit};

pub fn cmd_check(root: &Path) -> Result<()> {
  let registry = load_registry(root);

  if registry.is_empty() {
    print_info(&format!("no module descriptors found under {}", root.display()));
    return Ok(());
  }

  let plan = resolve_or_exit(&registry);

  print_success(&format!("{} module(s) resolve cleanly", plan.len()));
  Ok(())
}
