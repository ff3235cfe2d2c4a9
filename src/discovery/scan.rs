// src/discovery/scan.rs

//! Filesystem scan discovery.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{Instrument, Span, debug};

use super::Discovery;
use crate::exec::BoxFuture;
use crate::exec::command::run_shell;
use crate::fs::{FileSystem, RealFileSystem};
use crate::matcher::TargetMatcher;
use crate::matcher::path::is_hidden;

/// Discovery callback that:
/// 1. optionally runs a `prepare` shell command from the project root (this is
///    where directories and files get created),
/// 2. walks the project root and registers every matching directory as a
///    node and every matching file as a target.
///
/// Patterns are globs relative to the root, e.g. `"gen"` and `"gen/**"`.
/// Hidden entries are skipped and never descended into. Symlinked
/// directories are skipped too, so a link back up the tree cannot make the
/// walk register the same files under ever longer paths. Symlinked files
/// are matched like any other file.
///
/// The walk is blocking and runs on tokio's blocking pool.
#[derive(Clone)]
pub struct ScanDiscovery {
    root: PathBuf,
    prepare: Option<String>,
    patterns: Vec<String>,
    matchers: GlobSet,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for ScanDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanDiscovery")
            .field("root", &self.root)
            .field("prepare", &self.prepare)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl ScanDiscovery {
    /// Create a scan over `root` for the given glob patterns.
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            prepare: None,
            patterns: patterns.to_vec(),
            matchers: build_globset(patterns)?,
            fs: Arc::new(RealFileSystem),
        })
    }

    /// Shell command run before scanning.
    pub fn with_prepare(mut self, cmd: impl Into<String>) -> Self {
        self.prepare = Some(cmd.into());
        self
    }

    /// Use another filesystem implementation for the walk.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Walk the root and register matches. Returns `(nodes, targets)` seen.
    pub fn scan(&self, matcher: &TargetMatcher) -> Result<(usize, usize)> {
        let mut nodes = 0;
        let mut targets = 0;
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            for path in self.fs.read_dir(&dir)? {
                let Some(rel) = relative_str(&self.root, &path) else {
                    continue;
                };
                if is_hidden(&rel) {
                    continue;
                }

                if self.fs.is_dir(&path) {
                    if self.fs.is_symlink(&path) {
                        debug!(path = %rel, "skipping symlinked directory");
                        continue;
                    }
                    if self.matchers.is_match(&rel) {
                        matcher.register_node(&rel);
                        nodes += 1;
                    }
                    stack.push(path);
                } else if self.fs.is_file(&path) && self.matchers.is_match(&rel) {
                    matcher.register_target(&rel);
                    targets += 1;
                }
            }
        }

        Ok((nodes, targets))
    }
}

impl Discovery for ScanDiscovery {
    fn discover(&self, matcher: Arc<TargetMatcher>, span: Span) -> BoxFuture<'static, Result<()>> {
        let this = self.clone();

        Box::pin(
            async move {
                if let Some(prepare) = &this.prepare {
                    run_shell("prepare", prepare, &this.root, &[])
                        .await
                        .context("running discovery prepare command")?;
                }

                let root = this.root.clone();
                let walk_span = Span::current();
                let (nodes, targets) =
                    tokio::task::spawn_blocking(move || walk_span.in_scope(|| this.scan(&matcher)))
                        .await
                        .context("scan task panicked")?
                        .with_context(|| format!("scanning {root:?}"))?;
                debug!(nodes, targets, "scan discovery matched paths");
                Ok(())
            }
            .instrument(span),
        )
    }
}

/// Convert `path` into a string relative to `root`, with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
