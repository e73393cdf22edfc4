//! modlink - module dependency resolution for plugin build graphs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// modlink - declarative module dependency resolver
#[derive(Parser)]
#[command(name = "modlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root to scan for module descriptors
  #[arg(short, long, global = true, default_value = ".")]
  root: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate descriptors and the dependency graph
  Check,

  /// Resolve the build graph and write the plan artifact
  Plan {
    /// File to write the plan to
    #[arg(short, long, default_value = "plan.json")]
    out: PathBuf,
  },

  /// Show one module's declaration and resolved surfaces
  Info {
    /// Module name
    module: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// List registered modules
  List {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Check => cmd::cmd_check(&cli.root),
    Commands::Plan { out } => cmd::cmd_plan(&cli.root, &out),
    Commands::Info { module, format } => cmd::cmd_info(&cli.root, &module, format),
    Commands::List { format } => cmd::cmd_list(&cli.root, format),
  }
}
