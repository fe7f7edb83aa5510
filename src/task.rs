//! Task definitions and the task-execution collaborator.
//!
//! A generator owns one [`TaskEngine`]. The engine only knows how to register
//! tasks by name and run a list of them in order; planning which tasks to run
//! happens in [`crate::planner`].

use crate::error::TaskError;
use crate::generator::Generator;
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub type TaskFuture = BoxFuture<'static, anyhow::Result<()>>;
type TaskFn = Arc<dyn Fn(TaskContext) -> TaskFuture + Send + Sync>;

/// What a running task can see
#[derive(Clone)]
pub struct TaskContext {
    pub generator: Arc<Generator>,
    pub task: String,
}

/// A named, runnable unit of work
#[derive(Clone)]
pub struct Task {
    name: String,
    description: Option<String>,
    run: TaskFn,
}

impl Task {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            run: Arc::new(move |ctx: TaskContext| -> TaskFuture { Box::pin(run(ctx)) }),
        }
    }

    /// Task that does nothing; handy as a placeholder `default`
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, |_| async { Ok(()) })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn run(&self, ctx: TaskContext) -> TaskFuture {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Task-execution collaborator
#[async_trait]
pub trait TaskEngine: Send + Sync {
    fn has_task(&self, name: &str) -> bool;

    /// Register (or replace) a task
    fn task(&self, task: Task);

    /// Registered task names, in registration order
    fn task_names(&self) -> Vec<String>;

    /// Run `names` in order against `generator`, stopping at the first failure.
    async fn build(&self, names: &[String], generator: Arc<Generator>) -> Result<(), TaskError>;
}

/// Creates the engine for each new generator
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn TaskEngine> + Send + Sync>;

pub fn default_engine_factory() -> EngineFactory {
    Arc::new(|| -> Box<dyn TaskEngine> { Box::new(TaskSet::new()) })
}

/// Default engine: ordered task list, strictly sequential execution.
#[derive(Default)]
pub struct TaskSet {
    tasks: RwLock<Vec<Task>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Option<Task> {
        self.tasks.read().iter().find(|t| t.name == name).cloned()
    }
}

#[async_trait]
impl TaskEngine for TaskSet {
    fn has_task(&self, name: &str) -> bool {
        self.tasks.read().iter().any(|t| t.name == name)
    }

    fn task(&self, task: Task) {
        let mut tasks = self.tasks.write();
        match tasks.iter_mut().find(|t| t.name == task.name) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
    }

    fn task_names(&self) -> Vec<String> {
        self.tasks.read().iter().map(|t| t.name.clone()).collect()
    }

    async fn build(&self, names: &[String], generator: Arc<Generator>) -> Result<(), TaskError> {
        for name in names {
            let task = self
                .lookup(name)
                .ok_or_else(|| TaskError::NotFound(name.clone()))?;
            let started = Instant::now();
            debug!(generator = %generator.namespace(), task = %name, "Starting task");
            let ctx = TaskContext {
                generator: Arc::clone(&generator),
                task: name.clone(),
            };
            task.run(ctx)
                .await
                .map_err(|err| TaskError::failed(name.clone(), err))?;
            info!(
                generator = %generator.namespace(),
                task = %name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Finished task"
            );
        }
        Ok(())
    }
}
