//! Invocation engine: plan, merge configuration, run tasks, report errors.
//!
//! Every failure is returned from the `async` entry points. Config-hook and
//! task failures are additionally emitted as `error` events on the target
//! generator and each of its ancestors.

use crate::error::{share, GenerateError};
use crate::events::GeneratorEvent;
use crate::generator::{Generator, GetOptions, CACHE_CONFIG, DEFAULT};
use crate::planner::{Plan, TaskPlanner, TaskSpec};
use crate::store::Store;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct InvocationEngine<'a> {
    owner: &'a Arc<Generator>,
}

impl<'a> InvocationEngine<'a> {
    pub fn new(owner: &'a Arc<Generator>) -> Self {
        Self { owner }
    }

    pub async fn generate(
        &self,
        spec: &TaskSpec,
        options: &Map<String, Value>,
    ) -> Result<(), GenerateError> {
        let plan = TaskPlanner::new(self.owner).plan(spec)?;
        let Plan { generator, tasks } = plan;

        let Some(tasks) = tasks else {
            if !spec.is_explicit() {
                debug!(owner = %self.owner.namespace(), "Nothing to generate");
                return Ok(());
            }
            let err = match &generator {
                Some(generator) => GenerateError::TaskNotFound {
                    generator: generator.namespace(),
                    task: DEFAULT.to_string(),
                },
                None => self.not_found(spec),
            };
            return Err(self.fail(generator.as_ref().unwrap_or(self.owner), err));
        };
        let Some(generator) = generator else {
            return Err(self.fail(self.owner, self.not_found(spec)));
        };
        if let Some(missing) = tasks.iter().find(|t| !generator.has_task(t)) {
            let err = GenerateError::TaskNotFound {
                generator: generator.namespace(),
                task: missing.clone(),
            };
            return Err(self.fail(&generator, err));
        }

        self.merge_config(&generator, options)?;

        if let Err(err) = generator.process_config().await {
            return Err(self.fail(
                &generator,
                GenerateError::ConfigProcessingFailed {
                    generator: generator.namespace(),
                    source: share(err),
                },
            ));
        }

        self.owner.events().emit(&GeneratorEvent::Generate {
            alias: generator.alias().to_string(),
            tasks: tasks.clone(),
            generator: Arc::clone(&generator),
        });
        info!(
            generator = %generator.namespace(),
            tasks = %tasks.join(","),
            "Running tasks"
        );

        match generator.build(&tasks).await {
            Ok(()) => Ok(()),
            Err(source) => Err(self.fail(
                &generator,
                GenerateError::TaskExecutionFailed {
                    generator: generator.namespace(),
                    tasks,
                    source,
                },
            )),
        }
    }

    /// Owner options and cached config onto the target, then `default`'s
    /// options and data as fallbacks.
    fn merge_config(
        &self,
        generator: &Arc<Generator>,
        options: &Map<String, Value>,
    ) -> Result<(), GenerateError> {
        if !Arc::ptr_eq(generator, self.owner) {
            generator.options().merge(&self.owner.options().snapshot());
        }
        generator.options().merge(options);

        if let Some(Value::Object(cached)) = self.owner.store().get(CACHE_CONFIG) {
            let merged = match generator.store().get(CACHE_CONFIG) {
                Some(Value::Object(existing)) => Store::from_map(existing),
                _ => Store::new(),
            };
            merged.merge(&cached);
            generator
                .store()
                .set(CACHE_CONFIG, Value::Object(merged.snapshot()));
        }

        if let Some(default) = self
            .owner
            .find_generator(DEFAULT, &GetOptions::in_memory())?
        {
            if !Arc::ptr_eq(&default, generator) {
                generator.options().defaults(&default.options().snapshot());
                generator.data().defaults(&default.data().snapshot());
            }
        }
        Ok(())
    }

    /// Log `err` and, when it is a bubbling kind, emit it on `generator` and its ancestors.
    fn fail(&self, generator: &Arc<Generator>, err: GenerateError) -> GenerateError {
        let shared = Arc::new(err);
        let delivered = if shared.bubbles() {
            generator.emit_error(Arc::clone(&shared))
        } else {
            0
        };
        error!(
            generator = %generator.namespace(),
            listeners = delivered,
            error = %shared,
            "Generate failed"
        );
        (*shared).clone()
    }

    fn not_found(&self, spec: &TaskSpec) -> GenerateError {
        GenerateError::not_found(spec.target(), self.owner.runtime().search_paths())
    }
}

impl Generator {
    /// Plan `spec` against this generator and run it.
    pub async fn generate(
        self: &Arc<Self>,
        spec: impl Into<TaskSpec>,
    ) -> Result<(), GenerateError> {
        self.generate_with(spec, &Map::new()).await
    }

    /// Like [`Generator::generate`], merging `options` onto the target first.
    pub async fn generate_with(
        self: &Arc<Self>,
        spec: impl Into<TaskSpec>,
        options: &Map<String, Value>,
    ) -> Result<(), GenerateError> {
        let spec = spec.into();
        InvocationEngine::new(self).generate(&spec, options).await
    }

    /// Run each spec to completion before starting the next; stops at the first error.
    pub async fn generate_each<I, S>(
        self: &Arc<Self>,
        specs: I,
        options: &Map<String, Value>,
    ) -> Result<(), GenerateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskSpec>,
    {
        let specs: Vec<TaskSpec> = specs.into_iter().map(Into::into).collect();
        for spec in &specs {
            InvocationEngine::new(self).generate(spec, options).await?;
        }
        Ok(())
    }
}
