// src/engine/host.rs

use std::path::{Path, PathBuf};

use crate::exec::CacheStorage;

/// The calling build context a magic task runs in.
///
/// It owns the cache storage for its whole lifetime. Nested builds started by
/// magic tasks borrow it (unless caching is disabled) and always hand it back
/// before their own context is torn down.
#[derive(Debug)]
pub struct HostContext {
    root: PathBuf,
    cache: CacheStorage,
    use_cache: bool,
}

impl HostContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: CacheStorage::new(),
            use_cache: true,
        }
    }

    /// Enable or disable sharing the cache with nested builds
    /// (`--no-cache` turns it off).
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &CacheStorage {
        &self.cache
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }
}
