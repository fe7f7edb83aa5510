//! Key/value stores for generator options, data and cached config.
//!
//! Keys are dot-separated paths into nested JSON objects (`"cache.config"`).

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Thread-safe JSON object store with dotted-path access
#[derive(Debug, Default)]
pub struct Store {
    values: RwLock<Map<String, Value>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Read the value at `path`
    pub fn get(&self, path: &str) -> Option<Value> {
        let values = self.values.read();
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    /// Non-object intermediates are replaced.
    pub fn set(&self, path: &str, value: Value) {
        let mut values = self.values.write();
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut current = &mut *values;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.to_string(), value);
    }

    /// Merge `incoming` over the current values (incoming wins).
    pub fn merge(&self, incoming: &Map<String, Value>) {
        let mut values = self.values.write();
        merge_into(&mut values, incoming, true);
    }

    /// Fill in keys missing from this store (existing values win).
    pub fn defaults(&self, incoming: &Map<String, Value>) {
        let mut values = self.values.write();
        merge_into(&mut values, incoming, false);
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

fn merge_into(target: &mut Map<String, Value>, incoming: &Map<String, Value>, overwrite: bool) {
    for (key, value) in incoming {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_into(existing, nested, overwrite);
            }
            (Some(existing), _) => {
                if overwrite {
                    *existing = value.clone();
                }
            }
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
