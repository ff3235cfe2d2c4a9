// src/engine/resolve.rs

//! Resolution: caller arguments + discovered graph -> concrete build set.
//!
//! This is pure and synchronous so it can be unit tested without Tokio or
//! an executor.

use std::collections::HashSet;

use crate::matcher::TargetMatcher;
use crate::matcher::path::{dirname, is_segment_prefix, normalize};
use crate::types::BuildMode;

/// What a magic task is going to hand to the nested build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    /// Everything to build, deduplicated, in first-seen order.
    pub to_build: Vec<String>,
    /// The subset of `to_build` that names nodes.
    pub nodes: Vec<String>,
    /// The subset of `to_build` that names targets.
    pub targets: Vec<String>,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.to_build.is_empty()
    }

    fn add_node(&mut self, node: &str, seen: &mut HashSet<String>) {
        if !self.nodes.iter().any(|n| n == node) {
            self.nodes.push(node.to_string());
        }
        if seen.insert(node.to_string()) {
            self.to_build.push(node.to_string());
        }
    }

    fn add_target(&mut self, target: &str, seen: &mut HashSet<String>) {
        if !self.targets.iter().any(|t| t == target) {
            self.targets.push(target.to_string());
        }
        if seen.insert(target.to_string()) {
            self.to_build.push(target.to_string());
        }
    }
}

/// Resolve `args` against what discovery registered in `matcher`.
///
/// - Nothing discovered: empty plan.
/// - No arguments in `full` mode: every known node (registered or implied).
/// - Otherwise, per argument:
///   - it is built as a target if it was registered as one, or if its parent
///     directory is a known node;
///   - `full` mode: every known node equal to it or below it is built;
///   - `pre` mode: it is built as a node only if it was registered as one.
pub fn resolve(args: &[String], matcher: &TargetMatcher, mode: BuildMode) -> BuildPlan {
    let nodes = matcher.nodes();
    let targets = matcher.registered_targets();

    if nodes.is_empty() && targets.is_empty() {
        return BuildPlan::default();
    }

    if args.is_empty() && mode == BuildMode::Full {
        return BuildPlan {
            to_build: nodes.clone(),
            nodes,
            targets: Vec::new(),
        };
    }

    let mut plan = BuildPlan::default();
    let mut seen = HashSet::new();

    for arg in args {
        let arg = normalize(arg);

        if matcher.is_registered_target(&arg) || nodes.iter().any(|n| n == dirname(&arg)) {
            plan.add_target(&arg, &mut seen);
        }

        match mode {
            BuildMode::Full => {
                if matcher.is_required_node(&arg) {
                    for node in nodes.iter().filter(|node| is_segment_prefix(&arg, node)) {
                        plan.add_node(node, &mut seen);
                    }
                }
            }
            BuildMode::Pre => {
                if matcher.is_registered_node(&arg) {
                    plan.add_node(&arg, &mut seen);
                }
            }
        }
    }

    plan
}
