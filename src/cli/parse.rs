//! CLI parse: clap types for genkit. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// genkit - register generators and run their tasks
#[derive(Debug, Parser)]
#[command(name = "genkit")]
#[command(about = "Resolve generators by name or dot-path and run their tasks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one or more generate requests in order (`gen`, `gen:a,b`, `a.b.c:task`)
    Run {
        /// Generate requests
        #[arg(required = true)]
        specs: Vec<String>,

        /// Option passed to the target generator (repeatable)
        #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Show which generator and tasks a request resolves to, without running it
    Plan {
        /// Generate request
        spec: String,
    },
    /// List registered generators
    List {
        /// Also list generators discoverable in the workspace and search paths
        #[arg(long)]
        available: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
