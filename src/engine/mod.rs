// src/engine/mod.rs

//! Orchestration engine for magic tasks.
//!
//! This module ties together:
//! - discovery (callbacks registering nodes/targets with a matcher)
//! - resolution of the caller's arguments into a build plan ([`resolve`])
//! - the nested, cache-sharing build of that plan ([`task`])
//! - the factory owning several tasks plus the meta task ([`factory`])
//!
//! The calling build context is represented by [`HostContext`].

pub mod factory;
pub mod host;
pub mod resolve;
pub mod task;

pub use factory::{
    META_TASK_ENV, META_TASK_NAME, MagicFactory, meta_task_name_from_env, resolve_meta_task_name,
};
pub use host::HostContext;
pub use resolve::{BuildPlan, resolve};
pub use task::{ConfigureFn, MagicTask};
pub use crate::types::{BuildMode, MetaTaskState, TaskState};
