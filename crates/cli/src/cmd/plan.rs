//! Implementation of the `modlink plan` command.
//!
//! Resolves the module graph and writes the plan artifact. The plan is the
//! hand-off point to a compiler/linker toolchain; nothing is compiled here.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::output::symbols;

use super::{load_registry, resolve_or_exit};

pub fn cmd_plan(root: &Path, out: &Path) -> Result<()> {
  let registry = load_registry(root);
  let plan = resolve_or_exit(&registry);

  let plan_json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
  fs::write(out, plan_json).with_context(|| format!("Failed to write plan: {}", out.display()))?;

  let separator = format!(" {} ", symbols::ARROW);
  println!("Modules: {}", plan.len());
  println!("Order: {}", plan.order.join(separator.as_str()));
  println!("Waves: {}", plan.waves.len());
  for (i, wave) in plan.waves.iter().enumerate() {
    println!("  {}: {}", i + 1, wave.join(", "));
  }
  println!("Path: {}", out.display());

  Ok(())
}
