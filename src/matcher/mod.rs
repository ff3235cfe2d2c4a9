// src/matcher/mod.rs

//! Target/node matching.
//!
//! - [`path`] normalizes path strings and compares them segment-wise.
//! - [`target_matcher`] holds the caller's required targets and the nodes and
//!   targets registered by discovery, and answers requirement queries.

pub mod path;
pub mod target_matcher;

pub use path::normalize;
pub use target_matcher::TargetMatcher;
