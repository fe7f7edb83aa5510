//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name recorded on log events (e.g. "run", "list").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Run { .. } => "run",
        Commands::Plan { .. } => "plan",
        Commands::List { .. } => "list",
    }
}
