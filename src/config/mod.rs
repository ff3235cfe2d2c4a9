// src/config/mod.rs

//! Configuration loading and validation for magicbuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate tasks, scan patterns and node rules (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, NodeRuleConfig, RawConfigFile, TaskConfig};
pub use validate::{ensure_meta_task_is_free, validate_config};
