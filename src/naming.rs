//! Name resolution: registration keys to short aliases and prefix-qualified full names.

use std::fmt;
use std::sync::Arc;

/// Prefix used to qualify aliases when none is configured
pub const DEFAULT_PREFIX: &str = "generate";

/// Custom alias policy. Receives the raw registration name.
pub type AliasFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Default alias policy: everything after the first `-`.
///
/// `"generate-foo"` becomes `"foo"`; a name without a dash (or ending in one)
/// is returned unchanged.
pub fn alias(raw: &str) -> String {
    match raw.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => raw.to_string(),
    }
}

/// Qualify `alias` with `prefix`, leaving already-qualified names untouched.
pub fn full_name(alias: &str, prefix: &str) -> String {
    if prefix.is_empty() || is_qualified(alias, prefix) {
        return alias.to_string();
    }
    format!("{}-{}", prefix, alias)
}

fn is_qualified(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map(|rest| rest.starts_with('-'))
        .unwrap_or(false)
}

/// Naming policy shared by every generator in a tree.
#[derive(Clone)]
pub struct Naming {
    prefix: String,
    alias_fn: Option<AliasFn>,
}

impl Naming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            alias_fn: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_alias_fn(mut self, alias_fn: AliasFn) -> Self {
        self.alias_fn = Some(alias_fn);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Alias for `raw`. A per-call override wins over the configured policy.
    pub fn alias(&self, raw: &str, override_fn: Option<&AliasFn>) -> String {
        match override_fn.or(self.alias_fn.as_ref()) {
            Some(custom) => custom(raw),
            None => alias(raw),
        }
    }

    pub fn full_name(&self, alias: &str) -> String {
        full_name(alias, &self.prefix)
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Naming")
            .field("prefix", &self.prefix)
            .field("custom_alias", &self.alias_fn.is_some())
            .finish()
    }
}
