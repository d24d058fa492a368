use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Hierarchical to-do list CLI.
/// Storage defaults to ~/.todotree/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tdt", version, about = "Hierarchical to-do list manager")]
pub struct Cli {
    /// Path to the JSON tasks file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
