// tests/shell_executor.rs
#![cfg(unix)]

mod common;

use common::{TestResult, init_tracing, with_timeout};
use magicbuild::exec::{BuildExecutor, BuildRecord, CacheStorage, NodeRule, ProjectConfig, ShellExecutor};

fn executor() -> ShellExecutor {
    let mut project = ProjectConfig::new();
    project
        .node("gen", NodeRule::new("echo \"$MAGIC_NODE\" > \"$MAGIC_TARGET\""))
        .node("broken", NodeRule::new("exit 7"));
    ShellExecutor::new(project)
}

fn targets(p: &[&str]) -> Vec<String> {
    p.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn builds_with_node_rule_from_root() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("gen"))?;
    let executor = executor();

    let mut ctx = with_timeout(executor.init(dir.path())).await?;
    let info = with_timeout(executor.build_targets(&mut ctx, &targets(&["gen/out.txt"]))).await?;

    assert_eq!(info.built_targets, vec!["gen/out.txt"]);
    let written = std::fs::read_to_string(dir.path().join("gen/out.txt"))?;
    assert_eq!(written.trim(), "gen");
    assert_eq!(
        ctx.cache().and_then(|c| c.get("gen/out.txt")),
        Some(BuildRecord {
            node: "gen".to_string()
        })
    );

    executor.destruct(ctx);
    Ok(())
}

#[tokio::test]
async fn cached_paths_are_skipped() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let parent = CacheStorage::new();
    parent.insert(
        "gen/out.txt",
        BuildRecord {
            node: "gen".to_string(),
        },
    );
    let executor = executor();

    let mut ctx = with_timeout(executor.init(dir.path())).await?;
    ctx.borrow_cache(&parent);
    let info = with_timeout(executor.build_targets(&mut ctx, &targets(&["gen/out.txt"]))).await?;

    assert!(info.is_empty());
    assert!(!dir.path().join("gen/out.txt").exists());

    ctx.release_cache();
    executor.destruct(ctx);
    assert_eq!(parent.len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_rule_is_an_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = executor();

    let mut ctx = with_timeout(executor.init(dir.path())).await?;
    let err = with_timeout(executor.build_targets(&mut ctx, &targets(&["elsewhere/x"])))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no build rule for 'elsewhere/x'"));
    executor.destruct(ctx);
    Ok(())
}

#[tokio::test]
async fn failing_rule_is_an_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = executor();

    let mut ctx = with_timeout(executor.init(dir.path())).await?;
    let err = with_timeout(executor.build_targets(&mut ctx, &targets(&["broken"])))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("exited with code 7"));
    executor.destruct(ctx);
    Ok(())
}

#[tokio::test]
async fn init_requires_a_directory() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = executor();

    let result = with_timeout(executor.init(&dir.path().join("missing"))).await;
    assert!(result.is_err());
    Ok(())
}

#[test]
fn deepest_rule_wins() {
    let mut project = ProjectConfig::new();
    project
        .node(".", NodeRule::new("root"))
        .node("gen", NodeRule::new("gen"))
        .node("gen/sub", NodeRule::new("sub"));

    assert_eq!(project.rule_for("gen/sub/x").map(|(n, _)| n), Some("gen/sub"));
    assert_eq!(project.rule_for("gen/x").map(|(n, r)| (n, r.cmd.as_str())), Some(("gen", "gen")));
    assert_eq!(project.rule_for("gen-other/x").map(|(n, _)| n), Some("."));
    assert_eq!(project.rule_for("./gen/").map(|(n, _)| n), Some("gen"));
}
