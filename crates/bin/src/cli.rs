//! CLI argument definitions for the firetree binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format selection on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    /// Aligned tables and pretty JSON
    #[default]
    Human,
    /// One compact JSON document
    Json,
}

/// firetree: mirror a remote tree into local state
#[derive(Parser, Debug)]
#[command(name = "firetree")]
#[command(about = "firetree: inspect composite paths and mirror watched data into local state")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Human)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a composite path and show its query directives
    Parse(ParseArgs),
    /// Seed an in-memory store, watch paths in it and print the mirrored state
    Watch(WatchArgs),
    /// Fold a file of JSON actions into a fresh state and print it
    Reduce(ReduceArgs),
}

/// Arguments for the parse command
#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// Composite path, e.g. `scores#orderByChild=score&limitToLast=3`
    pub path: String,
}

/// Arguments for the watch command
#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// JSON file holding the initial contents of the store
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// JSON client config file
    #[arg(short, long, env = "FIRETREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Watch to attach, as `event:path` (repeatable), e.g. `child_added:rooms#limitToFirst=2`
    #[arg(short, long = "watch", required = true)]
    pub watches: Vec<String>,

    /// Redirect every watch to its base path, tagging values with their key
    #[arg(short, long)]
    pub dest: Option<String>,
}

/// Arguments for the reduce command
#[derive(clap::Args, Debug)]
pub struct ReduceArgs {
    /// File with one JSON action per line
    pub actions: PathBuf,
}
