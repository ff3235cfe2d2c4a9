#![allow(dead_code)]

use std::collections::BTreeMap;

use magicbuild::config::{ConfigFile, ConfigSection, NodeRuleConfig, RawConfigFile, TaskConfig};
use magicbuild::types::BuildMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                node: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_node(mut self, path: &str, cmd: &str) -> Self {
        self.config.node.insert(
            path.to_string(),
            NodeRuleConfig {
                cmd: cmd.to_string(),
            },
        );
        self
    }

    pub fn meta_task(mut self, name: &str) -> Self {
        self.config.config.meta_task = Some(name.to_string());
        self
    }

    pub fn use_cache(mut self, val: bool) -> Self {
        self.config.config.use_cache = val;
        self
    }

    /// The raw, unvalidated config.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn mode(mut self, mode: BuildMode) -> Self {
        self.task.mode = mode;
        self
    }

    pub fn prepare(mut self, cmd: &str) -> Self {
        self.task.prepare = Some(cmd.to_string());
        self
    }

    pub fn scan(mut self, pattern: &str) -> Self {
        self.task.scan.push(pattern.to_string());
        self
    }

    pub fn build_cmd(mut self, cmd: &str) -> Self {
        self.task.build_cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
