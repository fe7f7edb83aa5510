//! Module resolution: find generator manifests on disk by name.

use crate::naming::DEFAULT_PREFIX;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Manifest file name inside a generator directory
pub const MANIFEST_FILE: &str = "generator.toml";

const IGNORED_DIRS: &[&str] = &[".git", "target", "node_modules"];

/// Resolves a generator name that is not registered anywhere to a source path.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, name: &str, cwd: &Path) -> Option<PathBuf>;

    /// Locations searched, reported in not-found errors
    fn search_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// A generator found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Filesystem resolver.
///
/// For a name `foo` it looks for `foo` and `<prefix>-foo`, first in the cwd
/// and then in every search path. A candidate matches as a directory holding
/// `generator.toml` or as a `<candidate>.toml` file.
#[derive(Debug, Clone)]
pub struct FsResolver {
    prefix: String,
    search_paths: Vec<PathBuf>,
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl FsResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            search_paths: Vec::new(),
        }
    }

    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_paths.extend(paths);
        self
    }

    fn candidates(&self, name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if !self.prefix.is_empty() {
            let prefixed = format!("{}-{}", self.prefix, name);
            if !name.starts_with(&format!("{}-", self.prefix)) {
                names.push(prefixed);
            }
        }
        names
    }

    fn roots(&self, cwd: &Path) -> Vec<PathBuf> {
        let mut roots = vec![cwd.to_path_buf()];
        for path in &self.search_paths {
            let root = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }

    /// Every generator manifest reachable from the cwd and search paths,
    /// sorted by name. Only the top level of each root is considered.
    pub fn discover(&self, cwd: &Path) -> Vec<ModuleEntry> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for root in self.roots(cwd) {
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .max_depth(2)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_ignored(entry));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        debug!(root = %root.display(), error = %err, "Skipping unreadable entry");
                        continue;
                    }
                };
                let Some(module) = self.module_for(&entry) else {
                    continue;
                };
                let canonical = canonical(&module.path);
                if seen.insert(canonical.clone()) {
                    found.push(ModuleEntry {
                        name: module.name,
                        path: canonical,
                    });
                }
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    fn module_for(&self, entry: &DirEntry) -> Option<ModuleEntry> {
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.path();
        let file_name = path.file_name()?.to_str()?;
        if file_name == MANIFEST_FILE && entry.depth() == 2 {
            let dir = path.parent()?;
            let name = dir.file_name()?.to_str()?.to_string();
            return Some(ModuleEntry {
                name,
                path: dir.to_path_buf(),
            });
        }
        let stem = file_name.strip_suffix(".toml")?;
        let prefixed = format!("{}-", self.prefix);
        if entry.depth() == 1 && !self.prefix.is_empty() && stem.starts_with(&prefixed) {
            return Some(ModuleEntry {
                name: stem.to_string(),
                path: path.to_path_buf(),
            });
        }
        None
    }
}

impl ModuleResolver for FsResolver {
    fn resolve(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        if name.contains('/') || name.contains('\\') {
            let path = Path::new(name);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            return manifest_source(&path).map(|p| canonical(&p));
        }
        for root in self.roots(cwd) {
            for candidate in self.candidates(name) {
                let dir = root.join(&candidate);
                if dir.join(MANIFEST_FILE).is_file() {
                    debug!(name, path = %dir.display(), "Resolved generator directory");
                    return Some(canonical(&dir));
                }
                let file = root.join(format!("{}.toml", candidate));
                if file.is_file() {
                    debug!(name, path = %file.display(), "Resolved generator manifest");
                    return Some(canonical(&file));
                }
            }
        }
        None
    }

    fn search_paths(&self) -> Vec<PathBuf> {
        self.search_paths.clone()
    }
}

/// `path` itself if it is a manifest file or a directory holding one
fn manifest_source(path: &Path) -> Option<PathBuf> {
    if path.is_file() || path.join(MANIFEST_FILE).is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| IGNORED_DIRS.contains(&name))
            .unwrap_or(false)
}
