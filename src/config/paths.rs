//! Well-known configuration locations.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Workspace config file name
pub const WORKSPACE_FILE: &str = "genkit.toml";

/// Environment variable selecting `config/{env}.toml`
pub const ENV_VAR: &str = "GENKIT_ENV";

/// Prefix of `GENKIT__SECTION__KEY` overrides
pub const ENV_PREFIX: &str = "GENKIT";

/// `$XDG_CONFIG_HOME/genkit` (or the platform equivalent)
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "genkit").map(|dirs| dirs.config_dir().to_path_buf())
}

/// `$XDG_CONFIG_HOME/genkit/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
