use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use magicbuild::exec::{
    BoxFuture, BuildContext, BuildExecutor, BuildInfo, BuildRecord, ProjectConfig,
};
use magicbuild::matcher::path::dirname;

/// One call observed by the [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Init,
    Build {
        targets: Vec<String>,
        /// Whether the context had the parent's cache attached.
        cache_borrowed: bool,
        /// Node rules present in the context when the build started.
        rules: Vec<String>,
    },
    Destruct {
        /// Whether a cache was still attached at teardown.
        cache_attached: bool,
    },
}

/// A fake executor that:
/// - records every `init` / `build_targets` / `destruct` call
/// - "builds" each requested path by recording it in the attached cache
/// - skips paths already present in the cache
/// - can be told to fail on a given path
/// - clears whatever cache is still attached on `destruct`, like the shell
///   executor does.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    base: ProjectConfig,
    calls: Arc<Mutex<Vec<ExecutorCall>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node rules every new context starts from.
    pub fn with_project(mut self, project: ProjectConfig) -> Self {
        self.base = project;
        self
    }

    /// Make `build_targets` fail when it reaches `path`.
    pub fn fail_on(&self, path: &str) {
        *self.fail_on.lock().unwrap() = Some(path.to_string());
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The target lists passed to `build_targets`, in call order.
    pub fn build_requests(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ExecutorCall::Build { targets, .. } => Some(targets),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ExecutorCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ExecutorCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl BuildExecutor for FakeExecutor {
    fn init<'a>(&'a self, root: &'a Path) -> BoxFuture<'a, anyhow::Result<BuildContext<'static>>> {
        Box::pin(async move {
            self.record(ExecutorCall::Init);
            Ok(BuildContext::new(root, self.base.clone()))
        })
    }

    fn build_targets<'a, 'c>(
        &'a self,
        ctx: &'a mut BuildContext<'c>,
        targets: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<BuildInfo>>
    where
        'c: 'a,
    {
        Box::pin(async move {
            self.record(ExecutorCall::Build {
                targets: targets.to_vec(),
                cache_borrowed: ctx.is_cache_borrowed(),
                rules: ctx.project().node_names().map(str::to_string).collect(),
            });

            let fail_on = self.fail_on.lock().unwrap().clone();
            let mut built = Vec::new();

            for target in targets {
                if fail_on.as_deref() == Some(target.as_str()) {
                    bail!("fake build of '{target}' failed");
                }
                if let Some(cache) = ctx.cache() {
                    if cache.contains(target) {
                        continue;
                    }
                    cache.insert(
                        target.clone(),
                        BuildRecord {
                            node: dirname(target).to_string(),
                        },
                    );
                }
                built.push(target.clone());
            }

            Ok(BuildInfo::new(built))
        })
    }

    fn destruct(&self, ctx: BuildContext<'_>) {
        let cache_attached = ctx.cache().is_some();
        if let Some(cache) = ctx.cache() {
            cache.clear();
        }
        self.record(ExecutorCall::Destruct { cache_attached });
    }
}
