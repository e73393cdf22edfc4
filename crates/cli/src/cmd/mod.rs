use std::path::Path;

use modlink_lib::registry::ModuleRegistry;
use modlink_lib::resolve::{BuildPlan, resolve};

use crate::output::print_error;

mod check;
mod info;
mod list;
mod plan;

pub use check::cmd_check;
pub use info::cmd_info;
pub use list::cmd_list;
pub use plan::cmd_plan;

/// Discover the registry under `root`, exiting fatally on any
/// configuration error.
fn load_registry(root: &Path) -> ModuleRegistry {
  match ModuleRegistry::discover(root) {
    Ok(registry) => registry,
    Err(e) => {
      print_error(&e.to_string());
      std::process::exit(1);
    }
  }
}

/// Resolve the registry into a plan, exiting fatally on unresolved
/// dependencies or cycles.
fn resolve_or_exit(registry: &ModuleRegistry) -> BuildPlan {
  match resolve(registry) {
    Ok(plan) => plan,
    Err(e) => {
      print_error(&e.to_string());
      std::process::exit(1);
    }
  }
}
