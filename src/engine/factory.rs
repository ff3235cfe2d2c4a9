// src/engine/factory.rs

//! Factory of magic tasks and the meta task that runs all of them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::engine::host::HostContext;
use crate::engine::task::MagicTask;
use crate::errors::{MagicError, Result};
use crate::exec::{BuildExecutor, BuildInfo};
use crate::types::MetaTaskState;

/// Default name of the meta task.
pub const META_TASK_NAME: &str = "__magic__";

/// Environment variable overriding the meta task name.
pub const META_TASK_ENV: &str = "MAGIC_TASK";

/// Pick the meta task name: a non-blank `env` value, then a non-blank
/// `configured` value, then [`META_TASK_NAME`].
pub fn resolve_meta_task_name(env: Option<&str>, configured: Option<&str>) -> String {
    env.into_iter()
        .chain(configured)
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(META_TASK_NAME)
        .to_string()
}

/// [`resolve_meta_task_name`] with the current value of `MAGIC_TASK`.
pub fn meta_task_name_from_env(configured: Option<&str>) -> String {
    let env = std::env::var(META_TASK_ENV).ok();
    resolve_meta_task_name(env.as_deref(), configured)
}

/// Owns a set of named magic tasks sharing one build executor.
///
/// The factory also exposes a *meta task*: running it runs every task of the
/// factory concurrently with the same arguments, and returns the
/// concatenation of their built targets (in task-name order).
///
/// Factories are constructed explicitly and passed to whoever needs them;
/// there is no process-wide registry.
pub struct MagicFactory {
    executor: Arc<dyn BuildExecutor>,
    meta_task_name: String,
    tasks: BTreeMap<String, Arc<MagicTask>>,
    state: Mutex<MetaTaskState>,
}

impl std::fmt::Debug for MagicFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicFactory")
            .field("meta_task_name", &self.meta_task_name)
            .field("tasks", &self.task_names())
            .field("state", &self.meta_task_state())
            .finish_non_exhaustive()
    }
}

impl MagicFactory {
    /// Create a factory. The meta task name comes from a non-blank
    /// `MAGIC_TASK`, otherwise `__magic__`.
    pub fn new(executor: Arc<dyn BuildExecutor>) -> Self {
        Self {
            executor,
            meta_task_name: meta_task_name_from_env(None),
            tasks: BTreeMap::new(),
            state: Mutex::new(MetaTaskState::Initialized),
        }
    }

    /// Override the meta task name.
    pub fn with_meta_task_name(mut self, name: impl Into<String>) -> Self {
        self.meta_task_name = name.into();
        self
    }

    /// Create (or replace) the task called `name`.
    pub fn create_task(&mut self, name: impl Into<String>) -> Arc<MagicTask> {
        let name = name.into();
        let task = Arc::new(MagicTask::new(name.clone(), Arc::clone(&self.executor)));
        if self.tasks.insert(name.clone(), Arc::clone(&task)).is_some() {
            warn!(task = %name, "replacing existing magic task");
        }
        task
    }

    pub fn task(&self, name: &str) -> Option<Arc<MagicTask>> {
        self.tasks.get(name).cloned()
    }

    /// Names of the tasks the meta task runs.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn meta_task_name(&self) -> &str {
        &self.meta_task_name
    }

    pub fn meta_task_state(&self) -> MetaTaskState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a task by name; the meta task name runs every task.
    pub async fn run_task(
        &self,
        name: &str,
        host: &Arc<HostContext>,
        args: &[String],
    ) -> Result<BuildInfo> {
        if name == self.meta_task_name {
            return self.run_meta_task(host, args).await;
        }

        let task = self
            .task(name)
            .ok_or_else(|| MagicError::TaskNotFound(name.to_string()))?;
        task.run(host, args).await
    }

    /// Run every task concurrently with the same arguments.
    ///
    /// Unlike a fail-fast join, a failing task does not cut the others
    /// short: every task settles and emits its own `end` event, then the
    /// first error in task-name order is returned.
    pub async fn run_meta_task(
        &self,
        host: &Arc<HostContext>,
        args: &[String],
    ) -> Result<BuildInfo> {
        self.set_state(MetaTaskState::Running);
        let span = info_span!("meta_task", name = %self.meta_task_name);

        let result = self.run_all(host, args).instrument(span).await;

        match &result {
            Ok(info) => {
                info!(built = ?info.built_targets, "meta task fulfilled");
                self.set_state(MetaTaskState::Fulfilled);
            }
            Err(err) => {
                warn!(error = %err, "meta task failed");
                self.set_state(MetaTaskState::Failed);
            }
        }

        result
    }

    async fn run_all(&self, host: &Arc<HostContext>, args: &[String]) -> Result<BuildInfo> {
        let mut set = JoinSet::new();

        for (index, task) in self.tasks.values().enumerate() {
            let task = Arc::clone(task);
            let host = Arc::clone(host);
            let args = args.to_vec();
            set.spawn(async move { (index, task.run(&host, &args).await) });
        }

        debug!(tasks = self.tasks.len(), "meta task spawned magic tasks");

        let mut outcomes: Vec<Option<Result<BuildInfo>>> =
            (0..self.tasks.len()).map(|_| None).collect();

        while let Some(joined) = set.join_next().await {
            let (index, outcome) =
                joined.map_err(|e| MagicError::Other(anyhow::anyhow!("magic task panicked: {e}")))?;
            outcomes[index] = Some(outcome);
        }

        let mut built_targets = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            built_targets.extend(outcome?.built_targets);
        }

        Ok(BuildInfo::new(built_targets))
    }

    fn set_state(&self, state: MetaTaskState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}
