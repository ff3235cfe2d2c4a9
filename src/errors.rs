// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MagicError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A discovery callback failed; no `prebuild` event was emitted.
    #[error("Discovery failed in task '{task}': {source:#}")]
    Discovery {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    /// The nested build failed; the nested context has been torn down.
    #[error("Build failed in task '{task}': {source:#}")]
    Build {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MagicError>;
