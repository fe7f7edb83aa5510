//! Configuration System
//!
//! Layered configuration for the `genkit` binary and for embedders that want
//! a root generator wired from files: naming prefix, resolver search paths,
//! generators registered at startup, root options, persisted config and
//! logging.

use crate::generator::{Generator, CACHE_CONFIG};
use crate::logging::LoggingConfig;
use crate::naming::DEFAULT_PREFIX;
use crate::resolver::FsResolver;
use crate::runtime::Runtime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use paths::{global_config_path, WORKSPACE_FILE};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenkitConfig {
    /// Prefix used to derive full names (`<prefix>-<alias>`)
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Extra directories the module resolver searches, after the workspace
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Generators registered on the root at startup (name to manifest path)
    #[serde(default)]
    pub generators: BTreeMap<String, PathBuf>,

    /// Root generator options
    #[serde(default)]
    pub options: Map<String, Value>,

    /// Persisted configuration handed to config hooks (`cache.config`)
    #[serde(default)]
    pub config: Map<String, Value>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for GenkitConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            search_paths: Vec::new(),
            generators: BTreeMap::new(),
            options: Map::new(),
            config: Map::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Prefix(String),
    Generator(String, String),
    SearchPath(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Prefix(msg) => write!(f, "Prefix: {}", msg),
            ValidationError::Generator(name, msg) => write!(f, "Generator '{}': {}", name, msg),
            ValidationError::SearchPath(msg) => write!(f, "Search path: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Characters with meaning in generate requests (`a.b:x,y`)
const RESERVED: &[char] = &['.', ':', ','];

fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if let Some(c) = name.chars().find(|c| RESERVED.contains(c) || c.is_whitespace()) {
        return Err(format!("name cannot contain {:?}", c));
    }
    Ok(())
}

impl GenkitConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = check_name(&self.prefix) {
            errors.push(ValidationError::Prefix(e));
        } else if self.prefix.contains('/') || self.prefix.contains('\\') {
            errors.push(ValidationError::Prefix(
                "prefix cannot contain a path separator".to_string(),
            ));
        }

        for (name, path) in &self.generators {
            if let Err(e) = check_name(name) {
                errors.push(ValidationError::Generator(name.clone(), e));
            }
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Generator(
                    name.clone(),
                    "path cannot be empty".to_string(),
                ));
            }
        }

        for path in &self.search_paths {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::SearchPath(
                    "search path cannot be empty".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runtime rooted at `workspace_root`, resolving manifests from the
    /// workspace and the configured search paths.
    pub fn runtime(&self, workspace_root: &Path) -> Runtime {
        Runtime::new(workspace_root)
            .with_prefix(self.prefix.clone())
            .with_resolver(Arc::new(self.resolver(workspace_root)))
    }

    /// Filesystem resolver over the configured search paths
    pub fn resolver(&self, workspace_root: &Path) -> FsResolver {
        let search_paths = self.search_paths.iter().map(|p| absolutize(workspace_root, p));
        FsResolver::new(self.prefix.clone()).with_search_paths(search_paths)
    }

    /// Root generator with configured generators, options and config applied.
    pub fn root_generator(&self, name: &str, workspace_root: &Path) -> Arc<Generator> {
        let root = Generator::with_runtime(name, Arc::new(self.runtime(workspace_root)));
        if !self.options.is_empty() {
            root.option(self.options.clone());
        }
        if !self.config.is_empty() {
            root.store()
                .set(CACHE_CONFIG, Value::Object(self.config.clone()));
        }
        for (generator, path) in &self.generators {
            root.register(generator, absolutize(workspace_root, path));
        }
        root
    }
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
