//! Task planning: turn a `generator:task,task` request into a concrete plan.
//!
//! Names and tasks are first serialized to one canonical string
//! (`"a.b:x,y"`, `"a.b"`, `":x,y"` or `"default"`) and then split on the first
//! colon. An empty name before the colon targets the planning generator.
//! Without a colon the string is either a task list on the planning generator
//! or a generator name whose `default` task should run.

use crate::error::GenerateError;
use crate::generator::lookup::segments;
use crate::generator::{Generator, GetOptions, DEFAULT};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A generate request: generator name segments plus an optional task list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSpec {
    names: Vec<String>,
    tasks: Vec<String>,
}

impl TaskSpec {
    /// `name` may itself be dotted and carry tasks (`"a.b:x,y"`)
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().with_names([name.into()])
    }

    /// Name segments, joined with `.`
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(
            names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.trim().is_empty()),
        );
        self
    }

    /// Tasks; each item may itself be a comma-separated list
    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in tasks {
            self.tasks.extend(split_tasks(item.as_ref()));
        }
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    /// Canonical `"<dotted-name>:<comma-tasks>"` form
    pub fn canonical(&self) -> String {
        let name = self.names.join(".");
        let tasks = self.tasks.join(",");
        match (name.is_empty(), tasks.is_empty()) {
            (true, true) => DEFAULT.to_string(),
            (false, true) => name,
            (true, false) => format!(":{}", tasks),
            (false, false) => format!("{}:{}", name, tasks),
        }
    }

    /// Generator part of the request, for messages
    pub fn target(&self) -> String {
        let canonical = self.canonical();
        match canonical.split_once(':') {
            Some((name, _)) if !name.is_empty() => name.to_string(),
            _ => canonical,
        }
    }

    /// Whether the request names tasks or a generator other than `default`
    pub fn is_explicit(&self) -> bool {
        self.canonical() != DEFAULT
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for TaskSpec {
    fn from(name: &str) -> Self {
        TaskSpec::new(name)
    }
}

impl From<String> for TaskSpec {
    fn from(name: String) -> Self {
        TaskSpec::new(name)
    }
}

impl From<&String> for TaskSpec {
    fn from(name: &String) -> Self {
        TaskSpec::new(name.as_str())
    }
}

impl From<(&str, &str)> for TaskSpec {
    fn from((name, tasks): (&str, &str)) -> Self {
        TaskSpec::new(name).with_tasks([tasks])
    }
}

impl<const N: usize> From<(&str, [&str; N])> for TaskSpec {
    fn from((name, tasks): (&str, [&str; N])) -> Self {
        TaskSpec::new(name).with_tasks(tasks)
    }
}

impl<const N: usize, const M: usize> From<([&str; N], [&str; M])> for TaskSpec {
    fn from((names, tasks): ([&str; N], [&str; M])) -> Self {
        TaskSpec::default().with_names(names).with_tasks(tasks)
    }
}

fn split_tasks(tasks: &str) -> Vec<String> {
    tasks
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolved generator and task list.
///
/// `tasks == None` means no task list could be resolved, which is different
/// from an empty list.
#[derive(Clone, Default)]
pub struct Plan {
    pub generator: Option<Arc<Generator>>,
    pub tasks: Option<Vec<String>>,
}

impl Plan {
    fn new(generator: Arc<Generator>, tasks: Vec<String>) -> Self {
        Self {
            generator: Some(generator),
            tasks: Some(tasks),
        }
    }

    fn unresolved() -> Self {
        Self::default()
    }

    fn with_default_task(generator: Arc<Generator>) -> Self {
        let tasks = generator
            .has_task(DEFAULT)
            .then(|| vec![DEFAULT.to_string()]);
        Self {
            generator: Some(generator),
            tasks,
        }
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("generator", &self.generator.as_ref().map(|g| g.namespace()))
            .field("tasks", &self.tasks)
            .finish()
    }
}

pub struct TaskPlanner<'a> {
    owner: &'a Arc<Generator>,
}

impl<'a> TaskPlanner<'a> {
    pub fn new(owner: &'a Arc<Generator>) -> Self {
        Self { owner }
    }

    pub fn plan(&self, spec: &TaskSpec) -> Result<Plan, GenerateError> {
        let canonical = spec.canonical();
        let plan = match canonical.split_once(':') {
            None => self.plan_bare(&canonical)?,
            Some((name, tasks)) => self.plan_qualified(name, tasks)?,
        };
        debug!(owner = %self.owner.namespace(), spec = %canonical, plan = ?plan, "Planned tasks");
        Ok(plan)
    }

    fn plan_bare(&self, spec: &str) -> Result<Plan, GenerateError> {
        let tasks = split_tasks(spec);
        if !tasks.is_empty() && tasks.iter().all(|t| self.owner.has_task(t)) {
            return Ok(Plan::new(Arc::clone(self.owner), tasks));
        }
        Ok(match self.resolve_target(spec, true)? {
            Some(generator) => Plan::with_default_task(generator),
            None => Plan::unresolved(),
        })
    }

    fn plan_qualified(&self, name: &str, tasks: &str) -> Result<Plan, GenerateError> {
        let tasks = split_tasks(tasks);
        if tasks.is_empty() {
            return self.plan_bare(name);
        }
        let generator = if name.is_empty() {
            Some(Arc::clone(self.owner))
        } else {
            self.resolve_target(name, false)?
        };
        Ok(match generator {
            Some(generator) => Plan::new(generator, tasks),
            None => Plan::unresolved(),
        })
    }

    /// Resolve `name`, preferring a sub-generator of a registered `default`
    /// generator. Bare requests only do so for single-segment names.
    fn resolve_target(
        &self,
        name: &str,
        bare: bool,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        if name != DEFAULT && (!bare || segments(name).len() == 1) {
            if let Some(default) = self.owner.find_generator(DEFAULT, &GetOptions::in_memory())? {
                if !Arc::ptr_eq(&default, self.owner) {
                    if let Some(found) = default.get_local(name)? {
                        debug!(name, "Resolved through default generator");
                        return Ok(Some(found));
                    }
                }
            }
        }
        self.owner.get_generator(name)
    }
}

impl Generator {
    pub fn plan(self: &Arc<Self>, spec: impl Into<TaskSpec>) -> Result<Plan, GenerateError> {
        TaskPlanner::new(self).plan(&spec.into())
    }
}
