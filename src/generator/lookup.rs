//! Generator lookup: local registry, base registry, module resolver, and
//! dot-path traversal into nested generators.

use crate::error::GenerateError;
use crate::events::{GeneratorAction, GeneratorEvent};
use crate::generator::{Generator, GeneratorSource};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Pluggable lookup: maps a requested name to candidate names, tried in
/// order before the requested name itself.
pub trait Lookup: Send + Sync {
    fn candidates(&self, name: &str) -> Vec<String>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn candidates(&self, name: &str) -> Vec<String> {
        self(name)
    }
}

#[derive(Clone, Default)]
pub enum LookupStrategy {
    #[default]
    Default,
    /// Strategy registered on the runtime under this name
    Named(String),
    Custom(Arc<dyn Lookup>),
}

impl fmt::Debug for LookupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStrategy::Default => f.write_str("Default"),
            LookupStrategy::Named(name) => f.debug_tuple("Named").field(name).finish(),
            LookupStrategy::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Invoke the resolved generator if it has not run yet
    pub invoke: bool,
    pub lookup: LookupStrategy,
    /// Fall back to the runtime's module resolver
    pub resolve_modules: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            invoke: true,
            lookup: LookupStrategy::Default,
            resolve_modules: true,
        }
    }
}

impl GetOptions {
    /// Resolve without invoking the final generator
    pub fn uninvoked() -> Self {
        Self {
            invoke: false,
            ..Self::default()
        }
    }

    /// In-memory registries only
    pub fn in_memory() -> Self {
        Self {
            resolve_modules: false,
            ..Self::default()
        }
    }

    pub fn with_lookup(mut self, lookup: LookupStrategy) -> Self {
        self.lookup = lookup;
        self
    }
}

/// Names containing a path separator are never split into dot segments.
pub(crate) fn is_path_like(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}

pub(crate) fn segments(name: &str) -> Vec<&str> {
    if is_path_like(name) {
        vec![name]
    } else {
        name.split('.').collect()
    }
}

impl Generator {
    /// Resolve and invoke `name` (alias, full name, path or dot-path).
    pub fn get_generator(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        self.find_generator(name, &GetOptions::default())
    }

    pub fn find_generator(
        self: &Arc<Self>,
        name: &str,
        options: &GetOptions,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        let mut candidates = match self.lookup_for(&options.lookup)? {
            Some(lookup) => lookup.candidates(name),
            None => Vec::new(),
        };
        if !candidates.iter().any(|c| c == name) {
            candidates.push(name.to_string());
        }

        for candidate in &candidates {
            if let Some(found) = self.traverse(candidate, options, true)? {
                self.events.emit(&GeneratorEvent::Generator {
                    action: GeneratorAction::Fetched,
                    generator: Arc::clone(&found),
                });
                return Ok(Some(found));
            }
        }
        debug!(owner = %self.namespace(), name, "Generator not found");
        Ok(None)
    }

    /// True if `name` resolves in memory, without invoking anything.
    pub fn has_generator(self: &Arc<Self>, name: &str) -> bool {
        let options = GetOptions {
            invoke: false,
            resolve_modules: false,
            ..GetOptions::default()
        };
        matches!(self.traverse(name, &options, true), Ok(Some(_)))
    }

    /// Walk `dotted` one segment at a time from this generator.
    ///
    /// Returns `Ok(None)` as soon as a segment does not resolve.
    pub fn get_sub_generator(
        self: &Arc<Self>,
        dotted: &str,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        self.traverse(dotted, &GetOptions::default(), true)
    }

    /// Like [`Generator::get_sub_generator`], but the first segment is only
    /// looked up in this generator's own registry.
    pub fn get_local(
        self: &Arc<Self>,
        dotted: &str,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        self.traverse(dotted, &GetOptions::default(), false)
    }

    fn lookup_for(
        &self,
        strategy: &LookupStrategy,
    ) -> Result<Option<Arc<dyn Lookup>>, GenerateError> {
        match strategy {
            LookupStrategy::Default => Ok(None),
            LookupStrategy::Custom(lookup) => Ok(Some(Arc::clone(lookup))),
            LookupStrategy::Named(name) => self.runtime.lookup(name).map(Some).ok_or_else(|| {
                GenerateError::LookupMisconfigured(format!(
                    "no lookup strategy is registered as \"{}\"",
                    name
                ))
            }),
        }
    }

    fn traverse(
        self: &Arc<Self>,
        name: &str,
        options: &GetOptions,
        chain: bool,
    ) -> Result<Option<Arc<Generator>>, GenerateError> {
        let parts = segments(name);
        if parts.iter().any(|s| s.is_empty()) {
            return Ok(None);
        }
        let last = parts.len() - 1;
        let mut current: Option<Arc<Generator>> = None;
        for (idx, segment) in parts.iter().enumerate() {
            let next = match &current {
                None if chain => self.resolve_segment(segment, options),
                None => self.generators.lookup(segment),
                Some(parent) => parent.resolve_segment(segment, options),
            };
            let Some(next) = next else {
                if idx > 0 {
                    debug!(name, segment = %segment, "Sub-generator not found");
                }
                return Ok(None);
            };
            if idx < last || options.invoke {
                next.invoke()?;
            }
            current = Some(next);
        }
        Ok(current)
    }

    /// Local registry, then the base registry, then the module resolver.
    fn resolve_segment(self: &Arc<Self>, name: &str, options: &GetOptions) -> Option<Arc<Generator>> {
        if let Some(found) = self.generators.lookup(name) {
            return Some(found);
        }
        let base = self.base();
        if !Arc::ptr_eq(&base, self) {
            if let Some(found) = base.generators.lookup(name) {
                debug!(name, "Resolved generator from base");
                return Some(found);
            }
        }
        if options.resolve_modules {
            return self.resolve_module(name);
        }
        None
    }

    fn resolve_module(self: &Arc<Self>, name: &str) -> Option<Arc<Generator>> {
        let resolver = self.runtime.resolver()?;
        let path = resolver.resolve(name, self.runtime.cwd())?;
        info!(name, path = %path.display(), "Resolved generator module");
        Some(self.register(name, GeneratorSource::Path(path)))
    }
}
