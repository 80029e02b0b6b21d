pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taxomerge",
    version,
    about = "Merge and compare biological classification trees",
    long_about = "Taxomerge aligns source taxonomies against a growing union taxonomy, grafting \
                  what is new, refining where sources resolve the union and recording where they \
                  conflict. It can also classify every grouping of one tree against another."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true, env = "TAXOMERGE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge source taxonomies, highest priority first, into a union
    Merge(commands::merge::MergeArgs),

    /// Classify each grouping of an input tree against a reference tree
    Conflict(commands::conflict::ConflictArgs),
}
