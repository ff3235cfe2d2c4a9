// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How a magic task expands its arguments into the set of things to build.
///
/// - `Full`: arguments naming nodes (or directories of nodes) are expanded
///   to every discovered node below them; with no arguments everything that
///   was discovered is built (default behaviour).
/// - `Pre`: only arguments that are targets, or explicitly registered nodes,
///   are built; everything else only goes through discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Full,
    Pre,
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(BuildMode::Full),
            "pre" => Ok(BuildMode::Pre),
            other => Err(format!(
                "invalid build mode: {other} (expected \"full\" or \"pre\")"
            )),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Full => f.write_str("full"),
            BuildMode::Pre => f.write_str("pre"),
        }
    }
}

/// Lifecycle of a single magic task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// Never invoked.
    #[default]
    Idle,
    /// Invocation began, `start` was emitted.
    Started,
    /// Discovery callbacks are running.
    Discovering,
    /// Turning arguments plus the discovered graph into a build set.
    Resolving,
    /// The nested build is running.
    Building,
    /// Finished successfully (possibly with nothing to build).
    Fulfilled,
    /// Finished with an error.
    Failed,
}

/// State of the meta task that runs every magic task of a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaTaskState {
    /// Not run yet.
    #[default]
    Initialized,
    Running,
    Fulfilled,
    Failed,
}

impl fmt::Display for MetaTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetaTaskState::Initialized => "initialized",
            MetaTaskState::Running => "running",
            MetaTaskState::Fulfilled => "fulfilled",
            MetaTaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}
