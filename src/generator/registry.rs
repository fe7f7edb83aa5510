//! Generator registry: ordered, multi-keyed map of sub-generators.
//!
//! One generator is stored under several keys (alias, full name, raw name,
//! and any name it was later matched by). Overwriting any key evicts the
//! previous generator together with every key that pointed at it.

use crate::generator::Generator;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Inner {
    entries: Vec<Arc<Generator>>,
    keys: HashMap<String, Arc<Generator>>,
}

impl Inner {
    fn evict(&mut self, stale: &Arc<Generator>) {
        self.keys.retain(|_, g| !Arc::ptr_eq(g, stale));
        self.entries.retain(|g| !Arc::ptr_eq(g, stale));
    }
}

#[derive(Default)]
pub struct GeneratorRegistry {
    inner: RwLock<Inner>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `generator` under every key in `keys`
    pub fn insert(&self, keys: &[String], generator: Arc<Generator>) {
        let mut inner = self.inner.write();
        let stale: Vec<Arc<Generator>> = keys
            .iter()
            .filter_map(|key| inner.keys.get(key))
            .filter(|existing| !Arc::ptr_eq(existing, &generator))
            .cloned()
            .collect();
        for old in &stale {
            debug!(generator = %old.alias(), "Replacing registered generator");
            inner.evict(old);
        }
        for key in keys {
            inner.keys.insert(key.clone(), Arc::clone(&generator));
        }
        if !inner.entries.iter().any(|g| Arc::ptr_eq(g, &generator)) {
            inner.entries.push(generator);
        }
    }

    /// Exact key lookup
    pub fn get(&self, key: &str) -> Option<Arc<Generator>> {
        self.inner.read().keys.get(key).cloned()
    }

    /// Exact key lookup, then a scan of `is_match`. A match is memoized under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<Generator>> {
        if let Some(found) = self.get(name) {
            return Some(found);
        }
        let matched = self
            .inner
            .read()
            .entries
            .iter()
            .find(|g| g.is_match(name))
            .cloned()?;
        let mut inner = self.inner.write();
        // The entry may have been replaced between the read and write locks.
        if inner.entries.iter().any(|g| Arc::ptr_eq(g, &matched)) {
            inner.keys.insert(name.to_string(), Arc::clone(&matched));
        }
        debug!(name, generator = %matched.alias(), "Matched generator");
        Some(matched)
    }

    /// Registered generators in registration order
    pub fn list(&self) -> Vec<Arc<Generator>> {
        self.inner.read().entries.clone()
    }

    /// Keys that currently resolve to `generator`, sorted
    pub fn keys_for(&self, generator: &Arc<Generator>) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .read()
            .keys
            .iter()
            .filter(|(_, g)| Arc::ptr_eq(g, generator))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
