//! Single entry point for building a [`GenkitConfig`] from layered sources.

use crate::config::merge::merge_policy;
use crate::config::paths::{self, ENV_PREFIX};
use crate::config::sources::{global_file, workspace_file};
use crate::config::GenkitConfig;
use config::{ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    ///
    /// Layers, lowest to highest: defaults, global file, `genkit.toml`,
    /// `config/{GENKIT_ENV}.toml`, `GENKIT__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<GenkitConfig, ConfigError> {
        Self::load_with_global(workspace_root, Self::xdg_config_path().as_deref())
    }

    /// Like [`ConfigLoader::load`] with an explicit global config file
    pub fn load_with_global(
        workspace_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<GenkitConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        let config: GenkitConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            generators = config.generators.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load a single file over the defaults
    pub fn load_from_file(path: &Path) -> Result<GenkitConfig, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Message(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Global config file location, whether or not it exists
    pub fn xdg_config_path() -> Option<PathBuf> {
        paths::global_config_path()
    }
}
