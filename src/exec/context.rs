// src/exec/context.rs

//! Nested build context and the cache it may borrow from its parent.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{Span, debug};

use super::project::ProjectConfig;

/// What the cache remembers about a built path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    /// Node whose rule produced the path.
    pub node: String,
}

/// Thread-safe store of already built paths.
///
/// The parent (calling) context owns one of these for its whole lifetime;
/// nested build contexts only borrow it, so that repeated nested builds in
/// the same process do not redo work.
#[derive(Debug, Default)]
pub struct CacheStorage {
    entries: Mutex<HashMap<String, BuildRecord>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<BuildRecord> {
        self.entries().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries().contains_key(path)
    }

    pub fn insert(&self, path: impl Into<String>, record: BuildRecord) {
        self.entries().insert(path.into(), record);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, BuildRecord>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The cache attached to a [`BuildContext`].
#[derive(Debug)]
pub enum CacheSlot<'c> {
    /// No cache attached (after a borrowed cache was released).
    Empty,
    /// A private cache, torn down together with the context.
    Owned(CacheStorage),
    /// The parent's cache. Never owned: it must be released before teardown.
    Borrowed(&'c CacheStorage),
}

/// A fresh, independently-lifetimed build execution context.
///
/// Created by [`BuildExecutor::init`](super::BuildExecutor::init) with a
/// private cache. The orchestrator may swap in a borrowed reference to the
/// parent's cache for the duration of one nested build and must call
/// [`release_cache`](Self::release_cache) before handing the context to
/// `destruct`.
pub struct BuildContext<'c> {
    root: PathBuf,
    project: ProjectConfig,
    cache: CacheSlot<'c>,
    span: Span,
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .field("project", &self.project)
            .field("cache_borrowed", &self.is_cache_borrowed())
            .finish_non_exhaustive()
    }
}

impl<'c> BuildContext<'c> {
    pub fn new(root: impl Into<PathBuf>, project: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            project,
            cache: CacheSlot::Owned(CacheStorage::new()),
            span: Span::none(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-context build configuration (node rules).
    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut ProjectConfig {
        &mut self.project
    }

    /// The cache currently attached, owned or borrowed.
    pub fn cache(&self) -> Option<&CacheStorage> {
        match &self.cache {
            CacheSlot::Empty => None,
            CacheSlot::Owned(cache) => Some(cache),
            CacheSlot::Borrowed(cache) => Some(cache),
        }
    }

    pub fn is_cache_borrowed(&self) -> bool {
        matches!(self.cache, CacheSlot::Borrowed(_))
    }

    /// Attach the parent's cache. Any private cache is dropped.
    pub fn borrow_cache(&mut self, cache: &'c CacheStorage) {
        debug!(entries = cache.len(), "nested context borrowing parent cache");
        self.cache = CacheSlot::Borrowed(cache);
    }

    /// Detach a borrowed parent cache so that tearing the context down can
    /// never touch it. A private cache is left in place.
    pub fn release_cache(&mut self) -> Option<&'c CacheStorage> {
        match std::mem::replace(&mut self.cache, CacheSlot::Empty) {
            CacheSlot::Borrowed(cache) => {
                debug!("nested context released parent cache");
                Some(cache)
            }
            other => {
                self.cache = other;
                None
            }
        }
    }

    /// Logging scope shared with the calling context.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }
}
