//! Collaborators shared by every generator in a tree.
//!
//! A child generator always receives its owner's runtime, so naming policy,
//! module resolution, module loading and task engines stay uniform across the
//! hierarchy.

use crate::generator::Lookup;
use crate::manifest::{ManifestLoader, ModuleLoader};
use crate::naming::{AliasFn, Naming};
use crate::resolver::ModuleResolver;
use crate::task::{default_engine_factory, EngineFactory, TaskEngine};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Runtime {
    naming: Naming,
    cwd: PathBuf,
    resolver: Option<Arc<dyn ModuleResolver>>,
    loader: Arc<dyn ModuleLoader>,
    engines: EngineFactory,
    lookups: RwLock<HashMap<String, Arc<dyn Lookup>>>,
}

impl Runtime {
    /// Runtime rooted at `cwd`, with the default naming policy, manifest
    /// loader and sequential task engine, and no module resolver.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            naming: Naming::default(),
            cwd: cwd.into(),
            resolver: None,
            loader: Arc::new(ManifestLoader),
            engines: default_engine_factory(),
            lookups: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming = self.naming.with_prefix(prefix);
        self
    }

    pub fn with_alias_fn(mut self, alias_fn: AliasFn) -> Self {
        self.naming = self.naming.with_alias_fn(alias_fn);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_engine_factory(mut self, engines: EngineFactory) -> Self {
        self.engines = engines;
        self
    }

    /// Make a lookup strategy available to `LookupStrategy::Named`
    pub fn register_lookup(&self, name: impl Into<String>, lookup: Arc<dyn Lookup>) {
        self.lookups.write().insert(name.into(), lookup);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Lookup>> {
        self.lookups.read().get(name).cloned()
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn resolver(&self) -> Option<&Arc<dyn ModuleResolver>> {
        self.resolver.as_ref()
    }

    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }

    /// Directories the module resolver searches, for error reporting
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.resolver
            .as_ref()
            .map(|r| r.search_paths())
            .unwrap_or_default()
    }

    /// Resolve a dot-leading relative source path against the cwd.
    pub fn resolve_source_path(&self, path: &Path) -> PathBuf {
        if path.to_string_lossy().starts_with('.') {
            self.cwd.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub(crate) fn new_engine(&self) -> Box<dyn TaskEngine> {
        (self.engines)()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("naming", &self.naming)
            .field("cwd", &self.cwd)
            .field("resolver", &self.resolver.is_some())
            .field("lookups", &self.lookups.read().len())
            .finish()
    }
}
