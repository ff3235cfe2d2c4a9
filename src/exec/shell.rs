// src/exec/shell.rs

//! Production build executor: runs node rule commands through the shell.

use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::{Instrument, debug, info};

use super::backend::{BoxFuture, BuildExecutor, BuildInfo};
use super::command::run_shell;
use super::context::{BuildContext, BuildRecord};
use super::project::ProjectConfig;

/// Executor that builds each requested path by running the shell command of
/// the node rule responsible for it.
///
/// - Paths already present in the context's cache are skipped.
/// - A path with no matching rule is an error.
/// - Paths are built one after another, in the requested order.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    base: ProjectConfig,
}

impl ShellExecutor {
    /// Create an executor whose contexts start from the static `base` rules.
    pub fn new(base: ProjectConfig) -> Self {
        Self { base }
    }
}

impl BuildExecutor for ShellExecutor {
    fn init<'a>(&'a self, root: &'a Path) -> BoxFuture<'a, Result<BuildContext<'static>>> {
        Box::pin(async move {
            if !root.is_dir() {
                return Err(anyhow!("project root {:?} is not a directory", root));
            }
            debug!(root = ?root, rules = self.base.node_names().count(), "initialising build context");
            Ok(BuildContext::new(root, self.base.clone()))
        })
    }

    fn build_targets<'a, 'c>(
        &'a self,
        ctx: &'a mut BuildContext<'c>,
        targets: &'a [String],
    ) -> BoxFuture<'a, Result<BuildInfo>>
    where
        'c: 'a,
    {
        let span = ctx.span().clone();

        Box::pin(
            async move {
                let mut built = Vec::new();
                let root = ctx.root().to_path_buf();
                let root_str = root.to_string_lossy().into_owned();

                for target in targets {
                    if ctx.cache().is_some_and(|cache| cache.contains(target)) {
                        debug!(target = %target, "already built; cache hit");
                        continue;
                    }

                    let (node, rule) = ctx
                        .project()
                        .rule_for(target)
                        .map(|(node, rule)| (node.to_string(), rule.clone()))
                        .ok_or_else(|| anyhow!("no build rule for '{target}'"))?;

                    let envs = [
                        ("MAGIC_TARGET", target.as_str()),
                        ("MAGIC_NODE", node.as_str()),
                        ("MAGIC_ROOT", root_str.as_str()),
                    ];
                    run_shell(target, &rule.cmd, &root, &envs).await?;

                    if let Some(cache) = ctx.cache() {
                        cache.insert(target.clone(), BuildRecord { node });
                    }
                    built.push(target.clone());
                }

                info!(built = ?built, "nested build finished");
                Ok(BuildInfo::new(built))
            }
            .instrument(span),
        )
    }

    fn destruct(&self, ctx: BuildContext<'_>) {
        if let Some(cache) = ctx.cache() {
            debug!(entries = cache.len(), "dropping cache attached to build context");
            cache.clear();
        }
        debug!(root = ?ctx.root(), "build context destroyed");
    }
}
