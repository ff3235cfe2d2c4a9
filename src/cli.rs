// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `magicbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "magicbuild",
    version,
    about = "Build nodes and targets that only exist after their generators have run.",
    long_about = None
)]
pub struct CliArgs {
    /// Paths to build (nodes, directories of nodes, or targets).
    ///
    /// With none, every discovered node is built (in `full` mode).
    #[arg(value_name = "PATH")]
    pub targets: Vec<String>,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Run a single magic task instead of the meta task.
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Give nested builds a private cache instead of sharing the top-level one.
    #[arg(short = 'n', long)]
    pub no_cache: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MAGICBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and node rules, but don't build anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
