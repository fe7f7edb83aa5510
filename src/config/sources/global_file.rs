//! Global config file source: $XDG_CONFIG_HOME/genkit/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Add the global config file to `builder` if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    global_path: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_path else {
        return Ok(builder);
    };
    if path.is_file() {
        let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        builder = builder.add_source(File::from(canonical).format(FileFormat::Toml).required(false));
    } else {
        debug!(config_path = %path.display(), "No global configuration file");
    }
    Ok(builder)
}
