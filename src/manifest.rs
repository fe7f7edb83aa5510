//! Generator manifests: TOML files that define a generator's options, data,
//! shell tasks and nested generators.
//!
//! ```toml
//! description = "scaffold a library"
//!
//! [options]
//! license = "MIT"
//!
//! [tasks.default]
//! description = "write the skeleton"
//! run = ["mkdir -p src", "touch src/lib.rs"]
//!
//! [generators.ci]
//! path = "./ci"
//! ```

use crate::generator::{DefiningFn, Env, Generator, GeneratorSource};
use crate::resolver::MANIFEST_FILE;
use crate::task::{Task, TaskContext};
use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Turns a filesystem source into a defining function
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> anyhow::Result<DefiningFn>;
}

/// Loads `generator.toml` manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ModuleLoader for ManifestLoader {
    fn load(&self, path: &Path) -> anyhow::Result<DefiningFn> {
        let file = manifest_file(path);
        let manifest = Arc::new(GeneratorManifest::from_path(&file)?);
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!(path = %file.display(), tasks = manifest.tasks.len(), "Loaded generator manifest");
        Ok(manifest.into_defining_fn(dir))
    }
}

/// `path` itself for files, `path/generator.toml` for directories
pub fn manifest_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorManifest {
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults merged under the generator's options
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskManifest>,
    #[serde(default)]
    pub generators: BTreeMap<String, SubGenerator>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskManifest {
    #[serde(default)]
    pub description: Option<String>,
    /// Shell commands, run in order with `sh -c`
    #[serde(default)]
    pub run: Vec<String>,
    /// Working directory relative to the manifest; the runtime cwd when unset
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SubGenerator {
    Path { path: PathBuf },
    Inline(Box<GeneratorManifest>),
}

impl GeneratorManifest {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Install options, data, tasks and nested generators on `generator`.
    /// Relative paths resolve against `dir`.
    pub fn apply(&self, generator: &Arc<Generator>, dir: &Path) {
        generator.options().defaults(&self.options);
        generator.data().defaults(&self.data);

        for (name, task) in &self.tasks {
            generator.task(task.to_task(name, dir));
        }

        for (name, sub) in &self.generators {
            match sub {
                SubGenerator::Path { path } => {
                    let path = if path.is_absolute() {
                        path.clone()
                    } else {
                        dir.join(path)
                    };
                    generator.register(name, GeneratorSource::Path(path));
                }
                SubGenerator::Inline(manifest) => {
                    let manifest: Arc<GeneratorManifest> = Arc::new((**manifest).clone());
                    generator.register(
                        name,
                        GeneratorSource::Function(manifest.into_defining_fn(dir.to_path_buf())),
                    );
                }
            }
        }
    }

    fn into_defining_fn(self: Arc<Self>, dir: PathBuf) -> DefiningFn {
        Arc::new(
            move |generator: &Arc<Generator>, _base: &Arc<Generator>, _env: &Env| -> anyhow::Result<()> {
                self.apply(generator, &dir);
                Ok(())
            },
        )
    }
}

impl TaskManifest {
    fn to_task(&self, name: &str, dir: &Path) -> Task {
        let commands = Arc::new(self.run.clone());
        let cwd = self.cwd.as_ref().map(|cwd| dir.join(cwd));
        let task = Task::new(name, move |ctx: TaskContext| {
            let commands = Arc::clone(&commands);
            let cwd = cwd.clone();
            async move { run_commands(&commands, cwd, &ctx).await }
        });
        match &self.description {
            Some(description) => task.with_description(description.clone()),
            None => task,
        }
    }
}

async fn run_commands(
    commands: &[String],
    cwd: Option<PathBuf>,
    ctx: &TaskContext,
) -> anyhow::Result<()> {
    let cwd = cwd.unwrap_or_else(|| ctx.generator.runtime().cwd().to_path_buf());
    let namespace = ctx.generator.namespace();
    for command in commands {
        let started = Instant::now();
        info!(generator = %namespace, task = %ctx.task, command = %command, "Running command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .env("GENKIT_GENERATOR", &namespace)
            .env("GENKIT_TASK", &ctx.task)
            .status()
            .await
            .with_context(|| format!("failed to spawn `{}`", command))?;
        if !status.success() {
            bail!("command `{}` exited with {}", command, status);
        }
        debug!(
            command = %command,
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
    }
    Ok(())
}
