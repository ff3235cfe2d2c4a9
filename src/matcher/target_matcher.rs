// src/matcher/target_matcher.rs

//! Registry of dynamically discovered nodes and targets, filtered against
//! the paths the caller asked for.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::path::{dirname, is_ancestor, is_hidden, normalize, segments};

/// Which requirement rule to apply to a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Node,
    Target,
}

#[derive(Debug, Default)]
struct Registry {
    nodes: BTreeSet<String>,
    targets: BTreeSet<String>,
}

/// Matcher handed to every discovery callback of one task invocation.
///
/// It is constructed with the *required targets* (the caller's arguments).
/// An empty list means the caller wants everything that gets discovered.
///
/// Registration is filtered: `register_node` / `register_target` only keep a
/// path if it is required for its kind, and silently ignore it otherwise, so
/// discovery code can register unconditionally.
///
/// # Concurrency
///
/// One matcher is shared (through an `Arc`) by all discovery callbacks of an
/// invocation, which run concurrently and in no particular order. Every
/// registration is commutative and idempotent, so the final state does not
/// depend on how the callbacks interleave. The internal mutex only makes
/// `&self` registration sound; it is never held across an `.await`.
#[derive(Debug, Default)]
pub struct TargetMatcher {
    required: Vec<String>,
    registry: Mutex<Registry>,
}

impl TargetMatcher {
    /// Create a matcher for the given required targets.
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let required = required
            .into_iter()
            .map(|r| normalize(r.as_ref()))
            .collect();

        Self {
            required,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// The normalized required targets this matcher filters against.
    pub fn required_targets(&self) -> &[String] {
        &self.required
    }

    /// Register a node, if it is required.
    pub fn register_node(&self, node: impl AsRef<str>) {
        let node = normalize(node.as_ref());
        if self.is_required_node(&node) {
            trace!(node = %node, "registering node");
            self.registry().nodes.insert(node);
        }
    }

    /// Register several nodes. Order does not matter.
    pub fn register_nodes<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            self.register_node(node);
        }
    }

    /// Register a target, if it is required.
    pub fn register_target(&self, target: impl AsRef<str>) {
        let target = normalize(target.as_ref());
        if self.is_required_target(&target) {
            trace!(target = %target, "registering target");
            self.registry().targets.insert(target);
        }
    }

    /// Register several targets. Order does not matter.
    pub fn register_targets<I, S>(&self, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for target in targets {
            self.register_target(target);
        }
    }

    /// Whether `node` was explicitly registered.
    pub fn is_registered_node(&self, node: &str) -> bool {
        self.registry().nodes.contains(&normalize(node))
    }

    /// Whether `target` was explicitly registered.
    pub fn is_registered_target(&self, target: &str) -> bool {
        self.registry().targets.contains(&normalize(target))
    }

    /// Whether `node` is registered explicitly or implied by a registered
    /// target living directly inside it.
    pub fn has_node(&self, node: &str) -> bool {
        let node = normalize(node);
        let registry = self.registry();
        registry.nodes.contains(&node)
            || registry.targets.iter().any(|t| dirname(t) == node)
    }

    /// All known nodes: explicitly registered ones plus the parents of
    /// registered targets, without duplicates.
    pub fn nodes(&self) -> Vec<String> {
        let registry = self.registry();
        let mut all: BTreeSet<String> = registry.nodes.clone();
        all.extend(registry.targets.iter().map(|t| dirname(t).to_string()));
        all.into_iter().collect()
    }

    /// Explicitly registered nodes.
    pub fn registered_nodes(&self) -> Vec<String> {
        self.registry().nodes.iter().cloned().collect()
    }

    /// Explicitly registered targets.
    pub fn registered_targets(&self) -> Vec<String> {
        self.registry().targets.iter().cloned().collect()
    }

    /// Whether a node at `node` is wanted by the caller.
    ///
    /// A node is required when it equals a required target, lives below one,
    /// or is itself an ancestor of one (a deep required target pulls all of
    /// its parent nodes in).
    pub fn is_required_node(&self, node: &str) -> bool {
        self.is_required(node, Kind::Node)
    }

    /// Whether a target at `target` is wanted by the caller.
    ///
    /// A target is required when it equals a required target or lives below
    /// one.
    pub fn is_required_target(&self, target: &str) -> bool {
        self.is_required(target, Kind::Target)
    }

    fn is_required(&self, candidate: &str, kind: Kind) -> bool {
        let candidate = normalize(candidate);

        if is_hidden(&candidate) {
            return false;
        }

        if self.required.is_empty() {
            return true;
        }

        self.required.iter().any(|required| {
            let exact = segments(required).len() == segments(&candidate).len()
                && *required == candidate;

            exact
                || is_ancestor(required, &candidate)
                || (kind == Kind::Node && is_ancestor(&candidate, required))
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registration never leaves the sets half-updated, so a poisoned lock
        // still guards consistent data.
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
