// tests/cache_sharing.rs

mod common;

use std::sync::Arc;

use common::{TestResult, args, init_tracing, with_timeout};
use magicbuild::engine::{HostContext, MagicTask};
use magicbuild::exec::{BuildContext, BuildExecutor, BuildRecord, CacheStorage, ProjectConfig};
use magicbuild_test_utils::fake_executor::{ExecutorCall, FakeExecutor};
use magicbuild_test_utils::registering;

fn levels_task(executor: &FakeExecutor) -> MagicTask {
    let executor: Arc<dyn BuildExecutor> = Arc::new(executor.clone());
    let task = MagicTask::new("levels", executor);
    task.prebuild(registering(&["levels/a", "levels/b"], &["levels/a/index.html"]));
    task
}

#[tokio::test]
async fn parent_cache_survives_nested_build() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = levels_task(&executor);
    let host = HostContext::new(std::env::temp_dir());
    host.cache().insert(
        "preexisting",
        BuildRecord {
            node: ".".to_string(),
        },
    );

    with_timeout(task.run(&host, &[])).await?;

    assert!(host.cache().contains("preexisting"));
    assert!(host.cache().contains("levels/a"));
    assert!(host.cache().contains("levels/b"));
    assert_eq!(host.cache().len(), 3);

    assert_eq!(
        executor.calls().last(),
        Some(&ExecutorCall::Destruct {
            cache_attached: false
        })
    );
    Ok(())
}

#[tokio::test]
async fn parent_cache_survives_failed_nested_build() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    executor.fail_on("levels/b");
    let task = levels_task(&executor);
    let host = HostContext::new(std::env::temp_dir());

    let result = with_timeout(task.run(&host, &[])).await;

    assert!(result.is_err());
    assert!(host.cache().contains("levels/a"));
    assert_eq!(
        executor.calls().last(),
        Some(&ExecutorCall::Destruct {
            cache_attached: false
        })
    );
    Ok(())
}

#[tokio::test]
async fn shared_cache_skips_already_built_paths() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = levels_task(&executor);
    let host = HostContext::new(std::env::temp_dir());

    let first = with_timeout(task.run(&host, &args(&["levels/a"]))).await?;
    let second = with_timeout(task.run(&host, &[])).await?;

    assert_eq!(first.built_targets, vec!["levels/a"]);
    assert_eq!(second.built_targets, vec!["levels/b"]);
    Ok(())
}

#[tokio::test]
async fn no_cache_uses_private_cache() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = levels_task(&executor);
    let host = HostContext::new(std::env::temp_dir()).with_cache(false);

    let first = with_timeout(task.run(&host, &[])).await?;
    let second = with_timeout(task.run(&host, &[])).await?;

    assert_eq!(first.built_targets, second.built_targets);
    assert!(host.cache().is_empty());

    let builds: Vec<bool> = executor
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ExecutorCall::Build { cache_borrowed, .. } => Some(cache_borrowed),
            _ => None,
        })
        .collect();
    assert_eq!(builds, vec![false, false]);
    assert_eq!(
        executor.count(|c| *c == ExecutorCall::Destruct { cache_attached: true }),
        2
    );
    Ok(())
}

#[test]
fn release_cache_only_detaches_borrowed_cache() {
    let parent = CacheStorage::new();
    let mut ctx: BuildContext<'_> = BuildContext::new(".", ProjectConfig::new());

    assert!(ctx.cache().is_some());
    assert!(!ctx.is_cache_borrowed());
    assert!(ctx.release_cache().is_none());
    assert!(ctx.cache().is_some(), "private cache stays attached");

    ctx.borrow_cache(&parent);
    assert!(ctx.is_cache_borrowed());
    assert!(ctx.release_cache().is_some());
    assert!(ctx.cache().is_none());
    assert!(ctx.release_cache().is_none());
}

#[test]
fn cache_storage_basics() {
    let cache = CacheStorage::new();
    assert!(cache.is_empty());

    cache.insert(
        "gen/out.txt",
        BuildRecord {
            node: "gen".to_string(),
        },
    );
    assert!(cache.contains("gen/out.txt"));
    assert_eq!(cache.get("gen/out.txt").map(|r| r.node), Some("gen".to_string()));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.get("gen/out.txt").is_none());
}
