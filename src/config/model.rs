// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::BuildMode;

/// Raw configuration exactly as deserialized from TOML.
///
/// ```toml
/// [config]
/// meta_task = "__magic__"
/// use_cache = true
///
/// [node."gen"]
/// cmd = "touch $MAGIC_TARGET"
///
/// [task.levels]
/// mode = "full"
/// prepare = "mkdir -p gen && touch gen/out.txt"
/// scan = ["gen", "gen/**"]
/// ```
///
/// Use [`ConfigFile::try_from`] to validate it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Static node rules from `[node."<path>"]`.
    #[serde(default)]
    pub node: BTreeMap<String, NodeRuleConfig>,

    /// Magic tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub node: BTreeMap<String, NodeRuleConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Build a config without validation. Used by the validator and tests.
    pub fn new_unchecked(
        config: ConfigSection,
        node: BTreeMap<String, NodeRuleConfig>,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { config, node, task }
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.task.keys().map(|s| s.as_str())
    }

    pub fn get_task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Name of the meta task running every task. `MAGIC_TASK` wins over it.
    #[serde(default)]
    pub meta_task: Option<String>,

    /// Share the top-level cache with nested builds.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            meta_task: None,
            use_cache: default_use_cache(),
        }
    }
}

/// `[node."<path>"]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeRuleConfig {
    /// Shell command building one path below the node.
    pub cmd: String,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// `"full"` (default) or `"pre"`.
    #[serde(default)]
    pub mode: BuildMode,

    /// Shell command run before scanning; typically creates the dynamic
    /// directories and files.
    #[serde(default)]
    pub prepare: Option<String>,

    /// Glob patterns, relative to the project root, selecting which
    /// directories become nodes and which files become targets.
    #[serde(default)]
    pub scan: Vec<String>,

    /// Rule installed for discovered nodes that have no static rule.
    #[serde(default)]
    pub build_cmd: Option<String>,
}
