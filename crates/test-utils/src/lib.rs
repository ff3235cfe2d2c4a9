pub mod builders;
pub mod fake_executor;

use std::sync::{Arc, Mutex, Once};

use magicbuild::discovery::{Discovery, discovery_fn};
use magicbuild::engine::MagicTask;
use magicbuild::events::{EventKind, MagicEvent};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Discovery callback registering a fixed set of nodes and targets.
pub fn registering(nodes: &[&str], targets: &[&str]) -> impl Discovery + 'static {
    let nodes: Vec<String> = nodes.iter().map(|s| s.to_string()).collect();
    let targets: Vec<String> = targets.iter().map(|s| s.to_string()).collect();

    discovery_fn(move |matcher, _span| {
        let nodes = nodes.clone();
        let targets = targets.clone();
        async move {
            matcher.register_nodes(&nodes);
            matcher.register_targets(&targets);
            Ok(())
        }
    })
}

/// Discovery callback that always fails with `msg`.
pub fn failing(msg: &'static str) -> impl Discovery + 'static {
    discovery_fn(move |_matcher, _span| async move { Err(anyhow::anyhow!(msg)) })
}

/// Record every event of `task` as its kind, in delivery order.
pub fn record_events(task: &MagicTask) -> Arc<Mutex<Vec<EventKind>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::Start,
        EventKind::Prebuild,
        EventKind::Build,
        EventKind::Error,
        EventKind::End,
    ] {
        let seen = Arc::clone(&seen);
        task.on(kind, move |event: &MagicEvent<'_>| {
            seen.lock().unwrap().push(event.kind());
        });
    }
    seen
}
