// src/discovery/mod.rs

//! Discovery callbacks: the code that creates nodes and targets at run time
//! and registers them with a [`TargetMatcher`].
//!
//! - [`runner`] runs every callback of a task concurrently and joins them.
//! - [`scan`] is a ready-made callback that optionally runs a preparation
//!   command and then registers everything under the project root that
//!   matches a set of glob patterns.
//!
//! Callbacks of one invocation share a single matcher and race on it. They
//! must not rely on each other's registrations being visible, and must only
//! register (registration is idempotent and order-independent).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tracing::Span;

use crate::exec::BoxFuture;
use crate::matcher::TargetMatcher;

pub mod runner;
pub mod scan;

pub use runner::DiscoveryRunner;
pub use scan::ScanDiscovery;

/// A discovery callback.
///
/// `span` is the logging scope of this callback; implementations may use it
/// to attach their own diagnostics to the running task.
pub trait Discovery: Send + Sync {
    fn discover(&self, matcher: Arc<TargetMatcher>, span: Span) -> BoxFuture<'static, Result<()>>;
}

/// Adapter turning an async closure into a [`Discovery`].
pub struct FnDiscovery<F> {
    f: F,
}

impl<F> fmt::Debug for FnDiscovery<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDiscovery").finish_non_exhaustive()
    }
}

impl<F, Fut> Discovery for FnDiscovery<F>
where
    F: Fn(Arc<TargetMatcher>, Span) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn discover(&self, matcher: Arc<TargetMatcher>, span: Span) -> BoxFuture<'static, Result<()>> {
        Box::pin((self.f)(matcher, span))
    }
}

/// Wrap an async closure as a discovery callback.
///
/// ```ignore
/// task.prebuild(discovery_fn(|matcher, _span| async move {
///     matcher.register_target("gen/out.txt");
///     Ok(())
/// }));
/// ```
pub fn discovery_fn<F, Fut>(f: F) -> FnDiscovery<F>
where
    F: Fn(Arc<TargetMatcher>, Span) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnDiscovery { f }
}
