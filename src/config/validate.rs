// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::discovery::scan::build_globset;
use crate::engine::meta_task_name_from_env;
use crate::errors::{MagicError, Result};
use crate::matcher::normalize;
use crate::matcher::path::is_hidden;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MagicError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.node, raw.task))
    }
}

/// Re-run validation on an already constructed config (e.g. one built with
/// [`ConfigFile::new_unchecked`]).
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    let raw = RawConfigFile {
        config: cfg.config.clone(),
        node: cfg.node.clone(),
        task: cfg.task.clone(),
    };
    validate_raw_config(&raw)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_meta_task(cfg)?;
    validate_tasks(cfg)?;
    validate_node_rules(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(MagicError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_meta_task(cfg: &RawConfigFile) -> Result<()> {
    if cfg
        .config
        .meta_task
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(MagicError::ConfigError(
            "[config].meta_task must not be empty".to_string(),
        ));
    }

    let meta = meta_task_name_from_env(cfg.config.meta_task.as_deref());
    ensure_meta_task_is_free(cfg.task.keys(), &meta)
}

/// Fail when a task is called `meta`; the meta task would shadow it.
pub fn ensure_meta_task_is_free<'a>(
    mut task_names: impl Iterator<Item = &'a String>,
    meta: &str,
) -> Result<()> {
    if task_names.any(|name| name == meta) {
        return Err(MagicError::ConfigError(format!(
            "task '{meta}' collides with the meta task name"
        )));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.scan.is_empty() && task.prepare.is_none() {
            return Err(MagicError::ConfigError(format!(
                "task '{name}' needs `scan` patterns or a `prepare` command"
            )));
        }

        build_globset(&task.scan).map_err(|e| {
            MagicError::ConfigError(format!("task '{name}' has an invalid `scan` pattern: {e:#}"))
        })?;

        if task
            .build_cmd
            .as_deref()
            .is_some_and(|cmd| cmd.trim().is_empty())
        {
            return Err(MagicError::ConfigError(format!(
                "task '{name}' has an empty `build_cmd`"
            )));
        }
    }
    Ok(())
}

fn validate_node_rules(cfg: &RawConfigFile) -> Result<()> {
    for (path, rule) in cfg.node.iter() {
        let normalized = normalize(path);
        if normalized.is_empty() {
            return Err(MagicError::ConfigError(format!(
                "[node.\"{path}\"] does not name a path"
            )));
        }
        if normalized != "." && is_hidden(&normalized) {
            return Err(MagicError::ConfigError(format!(
                "[node.\"{path}\"] names a hidden path"
            )));
        }
        if rule.cmd.trim().is_empty() {
            return Err(MagicError::ConfigError(format!(
                "[node.\"{path}\"] has an empty `cmd`"
            )));
        }
    }
    Ok(())
}
