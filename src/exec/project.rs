// src/exec/project.rs

//! Build rules for nodes, attached to a build context.

use std::collections::BTreeMap;

use crate::matcher::path::{is_segment_prefix, normalize};

/// How to build the paths below one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRule {
    /// Shell command run once per requested path.
    ///
    /// It runs from the project root with `MAGIC_TARGET`, `MAGIC_NODE` and
    /// `MAGIC_ROOT` set.
    pub cmd: String,
}

impl NodeRule {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

/// Node rules known to a build context.
///
/// Static rules come from `[node."<path>"]` in the config; configure
/// callbacks add rules for nodes discovered at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    nodes: BTreeMap<String, NodeRule>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) the rule for `node`.
    pub fn node(&mut self, node: &str, rule: NodeRule) -> &mut Self {
        self.nodes.insert(normalize(node), rule);
        self
    }

    /// Declare a rule for `node` only if it has none yet.
    pub fn node_if_absent(&mut self, node: &str, rule: NodeRule) -> &mut Self {
        self.nodes.entry(normalize(node)).or_insert(rule);
        self
    }

    pub fn has_node(&self, node: &str) -> bool {
        self.nodes.contains_key(&normalize(node))
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Find the rule responsible for `path`: the one declared for the
    /// deepest node that equals `path` or contains it. A rule declared for
    /// `.` covers every path.
    pub fn rule_for(&self, path: &str) -> Option<(&str, &NodeRule)> {
        let path = normalize(path);
        self.nodes
            .iter()
            .filter(|(node, _)| node.as_str() == "." || is_segment_prefix(node, &path))
            .max_by_key(|(node, _)| if node.as_str() == "." { 0 } else { node.split('/').count() })
            .map(|(node, rule)| (node.as_str(), rule))
    }
}
