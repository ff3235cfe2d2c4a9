// src/engine/task.rs

//! A single magic task: discovery, resolution and the nested build.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{Instrument, Span, debug, info, info_span};

use crate::discovery::{Discovery, DiscoveryRunner};
use crate::engine::host::HostContext;
use crate::engine::resolve::{BuildPlan, resolve};
use crate::errors::{MagicError, Result};
use crate::events::{EventChannel, EventKind, MagicEvent};
use crate::exec::{BuildContext, BuildExecutor, BuildInfo, ProjectConfig};
use crate::matcher::TargetMatcher;
use crate::types::{BuildMode, TaskState};

/// Post-discovery configuration hook.
///
/// Called synchronously with the nested context's [`ProjectConfig`], the
/// nodes and the targets about to be built, before the nested build starts.
pub type ConfigureFn = dyn Fn(&mut ProjectConfig, &[String], &[String]) + Send + Sync;

#[derive(Clone, Default)]
struct TaskSetup {
    mode: BuildMode,
    prebuilds: Vec<Arc<dyn Discovery>>,
    configures: Vec<Arc<ConfigureFn>>,
}

/// Orchestrates one magic task.
///
/// An invocation goes through
/// `Idle -> Started -> Discovering -> Resolving -> Building -> Fulfilled | Failed`,
/// short-circuiting `Resolving -> Fulfilled` when there is nothing to build.
///
/// 1. `start` is emitted.
/// 2. Every discovery callback runs concurrently against a fresh
///    [`TargetMatcher`] built from the arguments.
/// 3. `prebuild` is emitted with the registered nodes and targets.
/// 4. The arguments are resolved into a [`BuildPlan`].
/// 5. A nested build context is created, borrows the host cache, runs the
///    configure hooks and builds the plan. The borrowed cache is released
///    and the context destroyed on every exit path.
/// 6. `build` or `error` is emitted, then `end`.
pub struct MagicTask {
    name: String,
    executor: Arc<dyn BuildExecutor>,
    runner: DiscoveryRunner,
    channel: EventChannel,
    setup: Mutex<TaskSetup>,
    state: Mutex<TaskState>,
}

impl fmt::Debug for MagicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicTask")
            .field("name", &self.name)
            .field("mode", &self.mode())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl MagicTask {
    pub fn new(name: impl Into<String>, executor: Arc<dyn BuildExecutor>) -> Self {
        Self {
            name: name.into(),
            executor,
            runner: DiscoveryRunner::new(),
            channel: EventChannel::new(),
            setup: Mutex::new(TaskSetup::default()),
            state: Mutex::new(TaskState::Idle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> BuildMode {
        self.setup().mode
    }

    pub fn set_mode(&self, mode: BuildMode) {
        self.setup().mode = mode;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a discovery callback. Callbacks run concurrently, in no order.
    pub fn prebuild(&self, discovery: impl Discovery + 'static) {
        self.setup().prebuilds.push(Arc::new(discovery));
    }

    /// Add a post-discovery configure hook. Hooks run in registration order.
    pub fn configure<F>(&self, hook: F)
    where
        F: Fn(&mut ProjectConfig, &[String], &[String]) + Send + Sync + 'static,
    {
        self.setup().configures.push(Arc::new(hook));
    }

    /// Subscribe to one kind of event of this task.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&MagicEvent<'_>) + Send + Sync + 'static,
    {
        self.channel.on(kind, handler);
    }

    /// Run the task with the given path arguments inside `host`.
    pub async fn run(&self, host: &HostContext, args: &[String]) -> Result<BuildInfo> {
        let setup = self.setup().clone();

        self.set_state(TaskState::Started);
        self.channel.emit(MagicEvent::Start);

        let span = info_span!("magic_task", task = %self.name, mode = %setup.mode);
        let result = self.run_inner(host, args, &setup).instrument(span).await;

        match &result {
            Ok(info) => {
                self.set_state(TaskState::Fulfilled);
                self.channel.emit(MagicEvent::Build(info));
            }
            Err(err) => {
                self.set_state(TaskState::Failed);
                self.channel.emit(MagicEvent::Error(err));
            }
        }
        self.channel.emit(MagicEvent::End);

        result
    }

    async fn run_inner(
        &self,
        host: &HostContext,
        args: &[String],
        setup: &TaskSetup,
    ) -> Result<BuildInfo> {
        self.set_state(TaskState::Discovering);
        let matcher = Arc::new(TargetMatcher::new(args));

        self.runner
            .run(&self.name, &setup.prebuilds, &matcher)
            .await
            .map_err(|source| MagicError::Discovery {
                task: self.name.clone(),
                source,
            })?;

        self.set_state(TaskState::Resolving);
        let registered_nodes = matcher.registered_nodes();
        let registered_targets = matcher.registered_targets();
        debug!(nodes = ?registered_nodes, targets = ?registered_targets, "discovery finished");
        self.channel.emit(MagicEvent::Prebuild {
            nodes: &registered_nodes,
            targets: &registered_targets,
        });

        let plan = resolve(args, &matcher, setup.mode);
        if plan.is_empty() {
            info!("nothing to build");
            return Ok(BuildInfo::default());
        }

        self.set_state(TaskState::Building);
        info!(to_build = ?plan.to_build, "starting nested build");

        self.build_plan(host, &plan, &setup.configures)
            .await
            .map_err(|source| MagicError::Build {
                task: self.name.clone(),
                source,
            })
    }

    /// Run the nested build for `plan`.
    ///
    /// The nested context only ever borrows the host cache: it is released
    /// before `destruct`, whether the build succeeded or not, so tearing the
    /// nested context down never clears the host's cache.
    async fn build_plan(
        &self,
        host: &HostContext,
        plan: &BuildPlan,
        configures: &[Arc<ConfigureFn>],
    ) -> anyhow::Result<BuildInfo> {
        let mut ctx: BuildContext<'_> = self.executor.init(host.root()).await?;

        if host.use_cache() {
            ctx.borrow_cache(host.cache());
        }
        ctx.set_span(Span::current());

        for configure in configures {
            configure(ctx.project_mut(), &plan.nodes, &plan.targets);
        }

        let result = self.executor.build_targets(&mut ctx, &plan.to_build).await;

        ctx.release_cache();
        self.executor.destruct(ctx);

        result
    }

    fn set_state(&self, state: TaskState) {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(task = %self.name, from = ?*guard, to = ?state, "task state transition");
        *guard = state;
    }

    fn setup(&self) -> MutexGuard<'_, TaskSetup> {
        self.setup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
