// src/discovery/runner.rs

//! Concurrent execution of discovery callbacks.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, debug_span, warn};

use super::Discovery;
use crate::matcher::TargetMatcher;

/// Runs every discovery callback of a task against one shared matcher.
///
/// Each callback is spawned as its own Tokio task, inside a `discovery`
/// span. The runner returns once **all** callbacks have completed; the first
/// failure aborts the remaining ones and is returned as is. A panicking
/// callback counts as a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryRunner;

impl DiscoveryRunner {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        task: &str,
        callbacks: &[Arc<dyn Discovery>],
        matcher: &Arc<TargetMatcher>,
    ) -> anyhow::Result<()> {
        if callbacks.is_empty() {
            debug!(task, "no discovery callbacks registered");
            return Ok(());
        }

        let mut set = JoinSet::new();

        for (index, callback) in callbacks.iter().enumerate() {
            let callback = Arc::clone(callback);
            let matcher = Arc::clone(matcher);
            let span = debug_span!("discovery", task = %task, index);
            let inner = span.clone();

            set.spawn(async move { callback.discover(matcher, inner).await }.instrument(span));
        }

        debug!(task, callbacks = callbacks.len(), "discovery callbacks spawned");

        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(join_err) => Err(anyhow!("discovery callback panicked: {join_err}")),
            };

            if let Err(err) = outcome {
                warn!(task, error = %err, "discovery callback failed; aborting the rest");
                set.abort_all();
                return Err(err);
            }
        }

        Ok(())
    }
}
