//! Error types for generator registration, resolution and task dispatch.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Shared, cloneable error source (task bodies and defining functions report `anyhow` errors).
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Convert an `anyhow::Error` into a cloneable source.
pub fn share(err: anyhow::Error) -> SharedError {
    let boxed: Box<dyn StdError + Send + Sync + 'static> = err.into();
    Arc::from(boxed)
}

/// Errors reported by a task engine while building a task list
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("task is not registered: {0}")]
    NotFound(String),

    #[error("task \"{task}\" failed: {source}")]
    Failed {
        task: String,
        #[source]
        source: SharedError,
    },
}

impl TaskError {
    /// Wrap a failure reported by a task body
    pub fn failed(task: impl Into<String>, err: anyhow::Error) -> Self {
        TaskError::Failed {
            task: task.into(),
            source: share(err),
        }
    }
}

/// Search locations reported alongside a failed lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths(pub Vec<PathBuf>);

impl fmt::Display for SearchPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let joined: Vec<String> = self.0.iter().map(|p| p.display().to_string()).collect();
        write!(f, " (searched: {})", joined.join(", "))
    }
}

/// Errors surfaced by the lookup, planning and invocation engine
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("cannot find generator or task: \"{name}\"{search_paths}")]
    GeneratorNotFound {
        name: String,
        search_paths: SearchPaths,
    },

    #[error("generator \"{generator}\" does not have task \"{task}\"")]
    TaskNotFound { generator: String, task: String },

    #[error("lookup strategy is misconfigured: {0}")]
    LookupMisconfigured(String),

    #[error("failed to invoke generator \"{name}\": {source}")]
    InvocationFailed {
        name: String,
        #[source]
        source: SharedError,
    },

    #[error("config processing failed for generator \"{generator}\": {source}")]
    ConfigProcessingFailed {
        generator: String,
        #[source]
        source: SharedError,
    },

    #[error("generator \"{generator}\" failed running [{}]: {source}", .tasks.join(", "))]
    TaskExecutionFailed {
        generator: String,
        tasks: Vec<String>,
        #[source]
        source: TaskError,
    },
}

impl GenerateError {
    pub fn not_found(name: impl Into<String>, search_paths: Vec<PathBuf>) -> Self {
        GenerateError::GeneratorNotFound {
            name: name.into(),
            search_paths: SearchPaths(search_paths),
        }
    }

    /// Whether this error is reported on the generator's event channel
    pub fn bubbles(&self) -> bool {
        matches!(
            self,
            GenerateError::ConfigProcessingFailed { .. } | GenerateError::TaskExecutionFailed { .. }
        )
    }
}

/// Application-level errors (configuration, logging, CLI)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}
