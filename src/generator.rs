//! Generators: nodes in a tree of registered behavior.
//!
//! A generator is created when it is registered and invoked (its defining
//! function executed) the first time it is resolved. Each generator owns its
//! tasks and a registry of sub-generators, and holds a weak reference to the
//! generator that registered it.

pub mod lookup;
pub mod registry;

pub use lookup::{GetOptions, Lookup, LookupStrategy};
pub use registry::GeneratorRegistry;

use crate::error::{share, GenerateError};
use crate::events::{EventChannel, EventKind, GeneratorAction, GeneratorEvent};
use crate::naming::AliasFn;
use crate::runtime::Runtime;
use crate::store::Store;
use crate::task::{Task, TaskContext, TaskEngine};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Name of the generator, and of the task, used when none is requested
pub const DEFAULT: &str = "default";

/// Store path of the persisted configuration handed to config hooks
pub const CACHE_CONFIG: &str = "cache.config";

/// Function executed once, on first resolution: `(generator, base, env)`
pub type DefiningFn =
    Arc<dyn Fn(&Arc<Generator>, &Arc<Generator>, &Env) -> anyhow::Result<()> + Send + Sync>;

/// Pre-task hook receiving the generator's cached config
pub type ConfigHook =
    Arc<dyn Fn(Arc<Generator>, Value) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Function,
    Filepath,
    Instance,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::Function => "function",
            SourceKind::Filepath => "filepath",
            SourceKind::Instance => "instance",
        };
        f.write_str(label)
    }
}

/// What a generator is registered from
#[derive(Clone)]
pub enum GeneratorSource {
    Function(DefiningFn),
    /// Manifest file or directory, loaded through the runtime's module loader
    Path(PathBuf),
    /// An already constructed generator, adopted as-is
    Instance(Arc<Generator>),
}

impl GeneratorSource {
    pub fn function<F>(define: F) -> Self
    where
        F: Fn(&Arc<Generator>, &Arc<Generator>, &Env) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        GeneratorSource::Function(Arc::new(define))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            GeneratorSource::Function(_) => SourceKind::Function,
            GeneratorSource::Path(_) => SourceKind::Filepath,
            GeneratorSource::Instance(_) => SourceKind::Instance,
        }
    }
}

impl From<PathBuf> for GeneratorSource {
    fn from(path: PathBuf) -> Self {
        GeneratorSource::Path(path)
    }
}

impl From<&Path> for GeneratorSource {
    fn from(path: &Path) -> Self {
        GeneratorSource::Path(path.to_path_buf())
    }
}

impl From<Arc<Generator>> for GeneratorSource {
    fn from(generator: Arc<Generator>) -> Self {
        GeneratorSource::Instance(generator)
    }
}

/// Options for a single registration
#[derive(Clone, Default)]
pub struct RegisterOptions {
    /// Alias policy for this registration only
    pub alias: Option<AliasFn>,
    /// Options merged onto the new generator
    pub options: Map<String, Value>,
}

/// Identity metadata handed to defining functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Env {
    pub alias: String,
    pub name: String,
    pub full_name: String,
    pub namespace: String,
    pub path: Option<PathBuf>,
    pub cwd: PathBuf,
}

enum Definition {
    Function(DefiningFn),
    Path(PathBuf),
    Instance,
}

pub struct Generator {
    alias: String,
    name: String,
    full_name: String,
    definition: Definition,
    invoked: AtomicBool,
    parent: RwLock<Weak<Generator>>,
    runtime: Arc<Runtime>,
    tasks: Box<dyn TaskEngine>,
    generators: GeneratorRegistry,
    events: EventChannel,
    options: Store,
    data: Store,
    store: Store,
    config_hook: RwLock<Option<ConfigHook>>,
}

impl Generator {
    /// Root generator with a default runtime rooted at the current directory
    pub fn new(name: &str) -> Arc<Self> {
        Self::with_runtime(name, Arc::new(Runtime::default()))
    }

    /// Root generator sharing `runtime` with everything registered below it
    pub fn with_runtime(name: &str, runtime: Arc<Runtime>) -> Arc<Self> {
        let alias = runtime.naming().alias(name, None);
        let full_name = runtime.naming().full_name(&alias);
        Arc::new(Self::create(
            name,
            alias,
            full_name,
            Definition::Instance,
            runtime,
            Weak::new(),
        ))
    }

    fn create(
        name: &str,
        alias: String,
        full_name: String,
        definition: Definition,
        runtime: Arc<Runtime>,
        parent: Weak<Generator>,
    ) -> Self {
        let invoked = matches!(definition, Definition::Instance);
        Self {
            alias,
            name: name.to_string(),
            full_name,
            definition,
            invoked: AtomicBool::new(invoked),
            parent: RwLock::new(parent),
            tasks: runtime.new_engine(),
            runtime,
            generators: GeneratorRegistry::new(),
            events: EventChannel::new(),
            options: Store::new(),
            data: Store::new(),
            store: Store::new(),
            config_hook: RwLock::new(None),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Name the generator was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn source_kind(&self) -> SourceKind {
        match self.definition {
            Definition::Function(_) => SourceKind::Function,
            Definition::Path(_) => SourceKind::Filepath,
            Definition::Instance => SourceKind::Instance,
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.definition {
            Definition::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_invoked(&self) -> bool {
        self.invoked.load(Ordering::SeqCst)
    }

    pub fn parent(&self) -> Option<Arc<Generator>> {
        self.parent.read().upgrade()
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Root of the tree this generator belongs to
    pub fn base(self: &Arc<Self>) -> Arc<Generator> {
        let mut current = Arc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Dot-joined aliases from the root's children down to this generator
    pub fn namespace(&self) -> String {
        match self.parent() {
            Some(parent) if !parent.is_root() => format!("{}.{}", parent.namespace(), self.alias),
            _ => self.alias.clone(),
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn options(&self) -> &Store {
        &self.options
    }

    pub fn data(&self) -> &Store {
        &self.data
    }

    /// Configuration store (`cache.config` lives here)
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Merge `values` over the current options
    pub fn option(&self, values: Map<String, Value>) -> &Self {
        self.options.merge(&values);
        self
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> &Self
    where
        F: Fn(&GeneratorEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
        self
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.has_task(name)
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.task_names()
    }

    /// Register a task on this generator
    pub fn task(&self, task: Task) -> &Self {
        self.tasks.task(task);
        self
    }

    /// Register a task from an async closure
    pub fn task_fn<F, Fut>(&self, name: &str, run: F) -> &Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.task(Task::new(name, run))
    }

    /// Install the pre-task config processing hook
    pub fn on_config<F, Fut>(&self, hook: F) -> &Self
    where
        F: Fn(Arc<Generator>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let hook: ConfigHook = Arc::new(
            move |generator: Arc<Generator>, config: Value| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(hook(generator, config))
            },
        );
        *self.config_hook.write() = Some(hook);
        self
    }

    pub fn env(&self) -> Env {
        Env {
            alias: self.alias.clone(),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            namespace: self.namespace(),
            path: self.source_path().map(Path::to_path_buf),
            cwd: self.runtime.cwd().to_path_buf(),
        }
    }

    /// True if `name` is this generator's alias, name, full name or source path
    pub fn is_match(&self, name: &str) -> bool {
        if name == self.alias || name == self.name || name == self.full_name {
            return true;
        }
        match &self.definition {
            Definition::Path(path) => path.as_path() == Path::new(name),
            _ => false,
        }
    }

    /// Register a sub-generator under `name`
    pub fn register(
        self: &Arc<Self>,
        name: &str,
        source: impl Into<GeneratorSource>,
    ) -> Arc<Generator> {
        self.register_with(name, source, &RegisterOptions::default())
    }

    pub fn register_with(
        self: &Arc<Self>,
        name: &str,
        source: impl Into<GeneratorSource>,
        options: &RegisterOptions,
    ) -> Arc<Generator> {
        let source = source.into();
        let naming = self.runtime.naming();
        let alias = naming.alias(name, options.alias.as_ref());
        let full_name = naming.full_name(&alias);

        let generator = match source {
            GeneratorSource::Instance(existing) => {
                if self.has_ancestor_or_self(&existing) {
                    debug!(
                        owner = %self.namespace(),
                        generator = %existing.alias(),
                        "Not adopting a generator into its own subtree"
                    );
                    return existing;
                }
                *existing.parent.write() = Arc::downgrade(self);
                existing.inherit_base_defaults();
                existing
            }
            GeneratorSource::Function(define) => Arc::new(Self::create(
                name,
                alias.clone(),
                full_name.clone(),
                Definition::Function(define),
                Arc::clone(&self.runtime),
                Arc::downgrade(self),
            )),
            GeneratorSource::Path(path) => Arc::new(Self::create(
                name,
                alias.clone(),
                full_name.clone(),
                Definition::Path(self.runtime.resolve_source_path(&path)),
                Arc::clone(&self.runtime),
                Arc::downgrade(self),
            )),
        };
        if !options.options.is_empty() {
            generator.options.merge(&options.options);
        }

        let mut keys = vec![alias, full_name];
        if !keys.iter().any(|k| k == name) {
            keys.push(name.to_string());
        }
        self.generators.insert(&keys, Arc::clone(&generator));

        info!(
            owner = %self.namespace(),
            generator = %generator.namespace(),
            source = %generator.source_kind(),
            "Registered generator"
        );
        self.events.emit(&GeneratorEvent::Generator {
            action: GeneratorAction::Registered,
            generator: Arc::clone(&generator),
        });
        generator
    }

    /// Execute the defining function once; later calls are no-ops.
    pub fn invoke(self: &Arc<Self>) -> Result<(), GenerateError> {
        if self.invoked.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let base = self.base();
        let env = self.env();
        let failed = |err: anyhow::Error| GenerateError::InvocationFailed {
            name: env.namespace.clone(),
            source: share(err),
        };

        let define = match &self.definition {
            Definition::Instance => None,
            Definition::Function(define) => Some(Arc::clone(define)),
            Definition::Path(path) => Some(self.runtime.loader().load(path).map_err(failed)?),
        };
        if let Some(define) = define {
            debug!(generator = %env.namespace, "Invoking generator");
            define(self, &base, &env).map_err(failed)?;
        }

        self.inherit_base_defaults();
        info!(generator = %env.namespace, "Generator invoked");
        Ok(())
    }

    /// Base options and data as defaults; values already set here win.
    fn inherit_base_defaults(self: &Arc<Self>) {
        let base = self.base();
        if !Arc::ptr_eq(self, &base) {
            self.options.defaults(&base.options.snapshot());
            self.data.defaults(&base.data.snapshot());
        }
    }

    fn has_ancestor_or_self(self: &Arc<Self>, other: &Arc<Generator>) -> bool {
        let mut current = Some(Arc::clone(self));
        while let Some(generator) = current {
            if Arc::ptr_eq(&generator, other) {
                return true;
            }
            current = generator.parent();
        }
        false
    }

    pub(crate) async fn process_config(self: &Arc<Self>) -> anyhow::Result<()> {
        let hook = self.config_hook.read().clone();
        let Some(hook) = hook else {
            return Ok(());
        };
        let config = self.store.get(CACHE_CONFIG).unwrap_or(Value::Null);
        hook(Arc::clone(self), config).await
    }

    pub(crate) async fn build(
        self: &Arc<Self>,
        tasks: &[String],
    ) -> Result<(), crate::error::TaskError> {
        self.tasks.build(tasks, Arc::clone(self)).await
    }

    /// Emit `err` on this generator and every ancestor; returns handlers run.
    pub fn emit_error(self: &Arc<Self>, err: Arc<GenerateError>) -> usize {
        let event = GeneratorEvent::Error(err);
        let mut delivered = 0;
        let mut current = Some(Arc::clone(self));
        while let Some(generator) = current {
            delivered += generator.events.emit(&event);
            current = generator.parent();
        }
        delivered
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("alias", &self.alias)
            .field("name", &self.name)
            .field("full_name", &self.full_name)
            .field("source", &self.source_kind())
            .field("invoked", &self.is_invoked())
            .finish()
    }
}
