// src/exec/backend.rs

//! Pluggable build executor abstraction.
//!
//! The orchestrator talks to a `BuildExecutor` instead of a concrete build
//! tool. This makes it easy to swap in a fake executor in tests while keeping
//! the production implementation in [`shell`](super::shell).
//!
//! An executor is driven through three steps per nested build:
//! - `init` creates a fresh [`BuildContext`] rooted at the project directory,
//! - `build_targets` builds a list of node/target paths inside it,
//! - `destruct` tears the context down (including any cache still attached).

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Result;

use super::context::BuildContext;

/// Boxed, sendable future returned by executor and discovery hooks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a (nested) build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    /// Paths that were built, in build order.
    pub built_targets: Vec<String>,
}

impl BuildInfo {
    pub fn new(built_targets: Vec<String>) -> Self {
        Self { built_targets }
    }

    pub fn is_empty(&self) -> bool {
        self.built_targets.is_empty()
    }
}

/// Trait abstracting the host build engine.
///
/// Production code uses [`ShellExecutor`](super::ShellExecutor); tests can
/// provide their own implementation that doesn't spawn real processes.
pub trait BuildExecutor: Send + Sync {
    /// Create a fresh build context for `root`, with a private cache.
    fn init<'a>(&'a self, root: &'a Path) -> BoxFuture<'a, Result<BuildContext<'static>>>;

    /// Build `targets` (node or target paths) inside `ctx`.
    fn build_targets<'a, 'c>(
        &'a self,
        ctx: &'a mut BuildContext<'c>,
        targets: &'a [String],
    ) -> BoxFuture<'a, Result<BuildInfo>>
    where
        'c: 'a;

    /// Tear `ctx` down.
    fn destruct(&self, ctx: BuildContext<'_>);
}
