//! CLI route: single route table and run context.

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_list_json, format_list_text, format_plan_text, format_run_summary, AvailableRow,
    GeneratorRow, RunSummary,
};
use crate::config::{ConfigLoader, GenkitConfig};
use crate::error::AppError;
use crate::generator::Generator;
use crate::planner::TaskSpec;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Name of the root generator the CLI builds
pub const ROOT_NAME: &str = "genkit";

/// Runtime context for CLI execution: workspace, loaded config and the root generator.
pub struct RunContext {
    workspace_root: PathBuf,
    config: GenkitConfig,
    root: Arc<Generator>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, AppError> {
        let workspace_root = dunce::canonicalize(&workspace_root).map_err(|e| {
            AppError::ConfigError(format!(
                "Workspace {} is not accessible: {}",
                workspace_root.display(),
                e
            ))
        })?;
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::from_config(workspace_root, config)
    }

    /// Build from an already loaded configuration
    pub fn from_config(workspace_root: PathBuf, config: GenkitConfig) -> Result<Self, AppError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            AppError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        let root = config.root_generator(ROOT_NAME, &workspace_root);
        debug!(
            workspace = %workspace_root.display(),
            generators = root.generators().len(),
            "Run context ready"
        );
        Ok(Self {
            workspace_root,
            config,
            root,
        })
    }

    pub fn root(&self) -> &Arc<Generator> {
        &self.root
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, AppError> {
        let started = Instant::now();
        let result = match command {
            Commands::Run { specs, options } => self.run(specs, options).await,
            Commands::Plan { spec } => self.plan(spec),
            Commands::List { available, format } => self.list(*available, format),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn run(&self, specs: &[String], raw_options: &[String]) -> Result<String, AppError> {
        let options = parse_options(raw_options)?;
        let specs: Vec<TaskSpec> = specs.iter().map(TaskSpec::from).collect();
        let started = Instant::now();
        self.root.generate_each(specs.iter().cloned(), &options).await?;
        Ok(format_run_summary(&RunSummary {
            specs: specs.iter().map(ToString::to_string).collect(),
            duration: started.elapsed(),
        }))
    }

    fn plan(&self, spec: &str) -> Result<String, AppError> {
        let spec = TaskSpec::from(spec);
        let plan = self.root.plan(spec.clone())?;
        Ok(format_plan_text(&spec, &plan))
    }

    fn list(&self, available: bool, format: &str) -> Result<String, AppError> {
        let registered = self.root.generators().list();
        let rows: Vec<GeneratorRow> = registered
            .iter()
            .map(|generator| GeneratorRow {
                alias: generator.alias().to_string(),
                full_name: generator.full_name().to_string(),
                namespace: generator.namespace(),
                source: generator.source_kind().to_string(),
                tasks: generator
                    .invoke()
                    .map(|_| generator.task_names())
                    .map_err(|e| e.to_string()),
            })
            .collect();

        let available_rows = available.then(|| {
            let known: HashSet<PathBuf> = registered
                .iter()
                .filter_map(|g| g.source_path().map(|p| dunce::canonicalize(p).unwrap_or_else(|_| p.to_path_buf())))
                .collect();
            self.config
                .resolver(&self.workspace_root)
                .discover(&self.workspace_root)
                .into_iter()
                .filter(|module| !known.contains(&module.path))
                .map(|module| AvailableRow {
                    name: module.name,
                    path: module.path,
                })
                .collect::<Vec<_>>()
        });

        match format {
            "json" => Ok(format_list_json(&rows, available_rows.as_deref())),
            "text" => Ok(format_list_text(&rows, available_rows.as_deref())),
            other => Err(AppError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Parse `key=value` pairs; values that parse as JSON keep their type.
pub fn parse_options(raw: &[String]) -> Result<Map<String, Value>, AppError> {
    let mut options = Map::new();
    for entry in raw {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            AppError::ConfigError(format!("Invalid option '{}': expected key=value", entry))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::ConfigError(format!(
                "Invalid option '{}': key cannot be empty",
                entry
            )));
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}
