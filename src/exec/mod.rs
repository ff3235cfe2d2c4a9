// src/exec/mod.rs

//! Nested build execution layer.
//!
//! - [`backend`] provides the `BuildExecutor` trait the orchestrator drives,
//!   plus `BuildInfo`.
//! - [`context`] holds the nested `BuildContext` and the `CacheStorage` it
//!   may borrow from the calling context.
//! - [`project`] holds per-context node rules (`ProjectConfig`).
//! - [`shell`] is the production executor running node rules through the
//!   shell, using the process helpers in [`command`].

pub mod backend;
pub mod command;
pub mod context;
pub mod project;
pub mod shell;

pub use backend::{BoxFuture, BuildExecutor, BuildInfo};
pub use context::{BuildContext, BuildRecord, CacheSlot, CacheStorage};
pub use project::{NodeRule, ProjectConfig};
pub use shell::ShellExecutor;
