// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
///
/// Use [`load_and_validate`] for anything that is going to run.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = ?path, tasks = config.task.len(), "config file parsed");

    Ok(config)
}

/// Load a configuration file and validate it:
///
/// - at least one task, each with a discovery source;
/// - scan globs compile;
/// - the meta task name does not shadow a task;
/// - node rule paths are usable.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Magicbuild.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Magicbuild.toml")
}
