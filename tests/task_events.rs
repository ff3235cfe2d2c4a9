// tests/task_events.rs

mod common;

use std::sync::{Arc, Mutex};

use common::{TestResult, args, init_tracing, with_timeout};
use magicbuild::discovery::discovery_fn;
use magicbuild::engine::{HostContext, MagicTask};
use magicbuild::errors::MagicError;
use magicbuild::events::{EventKind, MagicEvent};
use magicbuild::exec::{BuildExecutor, NodeRule};
use magicbuild::types::TaskState;
use magicbuild_test_utils::fake_executor::{ExecutorCall, FakeExecutor};
use magicbuild_test_utils::{failing, record_events, registering};

fn task_with(executor: &FakeExecutor) -> MagicTask {
    let executor: Arc<dyn BuildExecutor> = Arc::new(executor.clone());
    MagicTask::new("levels", executor)
}

fn host() -> HostContext {
    HostContext::new(std::env::temp_dir())
}

#[tokio::test]
async fn no_discovery_and_no_args_builds_nothing() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    let events = record_events(&task);

    let prebuild_payload = Arc::new(Mutex::new(None));
    {
        let payload = Arc::clone(&prebuild_payload);
        task.on(EventKind::Prebuild, move |event| {
            if let MagicEvent::Prebuild { nodes, targets } = event {
                *payload.lock().unwrap() = Some((nodes.to_vec(), targets.to_vec()));
            }
        });
    }
    let built_payload = Arc::new(Mutex::new(None));
    {
        let payload = Arc::clone(&built_payload);
        task.on(EventKind::Build, move |event| {
            if let MagicEvent::Build(info) = event {
                *payload.lock().unwrap() = Some(info.built_targets.clone());
            }
        });
    }

    let info = with_timeout(task.run(&host(), &[])).await?;

    assert!(info.built_targets.is_empty());
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            EventKind::Start,
            EventKind::Prebuild,
            EventKind::Build,
            EventKind::End
        ]
    );
    assert_eq!(
        *prebuild_payload.lock().unwrap(),
        Some((Vec::<String>::new(), Vec::<String>::new()))
    );
    assert_eq!(*built_payload.lock().unwrap(), Some(Vec::new()));
    assert!(executor.calls().is_empty(), "no nested build expected");
    assert_eq!(task.state(), TaskState::Fulfilled);
    Ok(())
}

#[tokio::test]
async fn no_args_builds_discovered_node() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &["gen/out.txt"]));

    let info = with_timeout(task.run(&host(), &[])).await?;

    assert_eq!(executor.build_requests(), vec![vec!["gen".to_string()]]);
    assert_eq!(info.built_targets, vec!["gen"]);
    Ok(())
}

#[tokio::test]
async fn target_arg_builds_only_that_target() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &["gen/out.txt"]));

    let info = with_timeout(task.run(&host(), &args(&["gen/out.txt"]))).await?;

    assert_eq!(
        executor.build_requests(),
        vec![vec!["gen/out.txt".to_string()]]
    );
    assert_eq!(info.built_targets, vec!["gen/out.txt"]);
    Ok(())
}

#[tokio::test]
async fn failing_discovery_skips_prebuild_and_build() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &[]));
    task.prebuild(failing("generator exploded"));
    let events = record_events(&task);

    let err = with_timeout(task.run(&host(), &[])).await.unwrap_err();

    match &err {
        MagicError::Discovery { task, source } => {
            assert_eq!(task, "levels");
            assert!(source.to_string().contains("generator exploded"));
        }
        other => panic!("expected Discovery error, got {other:?}"),
    }
    assert_eq!(
        *events.lock().unwrap(),
        vec![EventKind::Start, EventKind::Error, EventKind::End]
    );
    assert!(executor.calls().is_empty());
    assert_eq!(task.state(), TaskState::Failed);
    Ok(())
}

#[tokio::test]
async fn failing_nested_build_emits_error_and_tears_down() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    executor.fail_on("gen");
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &[]));
    let events = record_events(&task);

    let err = with_timeout(task.run(&host(), &[])).await.unwrap_err();

    assert!(matches!(err, MagicError::Build { .. }), "got {err:?}");
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            EventKind::Start,
            EventKind::Prebuild,
            EventKind::Error,
            EventKind::End
        ]
    );
    assert_eq!(
        executor.count(|c| matches!(c, ExecutorCall::Destruct { .. })),
        1
    );
    Ok(())
}

#[tokio::test]
async fn discovery_callbacks_share_one_matcher() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["a"], &["a/1.txt"]));
    task.prebuild(registering(&["b"], &["b/1.txt"]));
    task.prebuild(discovery_fn(|matcher, _span| async move {
        tokio::task::yield_now().await;
        matcher.register_node("c");
        matcher.register_node(".hidden");
        Ok(())
    }));

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        task.on(EventKind::Prebuild, move |event| {
            if let MagicEvent::Prebuild { nodes, targets } = event {
                seen.lock().unwrap().push((nodes.to_vec(), targets.to_vec()));
            }
        });
    }

    with_timeout(task.run(&host(), &[])).await?;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, vec!["a", "b", "c"]);
    assert_eq!(seen[0].1, vec!["a/1.txt", "b/1.txt"]);
    assert_eq!(
        executor.build_requests(),
        vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
    );
    Ok(())
}

#[tokio::test]
async fn configure_hooks_see_plan_before_build() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &["gen/out.txt"]));

    let hook_args = Arc::new(Mutex::new(Vec::new()));
    {
        let hook_args = Arc::clone(&hook_args);
        task.configure(move |project, nodes, targets| {
            hook_args
                .lock()
                .unwrap()
                .push((nodes.to_vec(), targets.to_vec()));
            for node in nodes {
                project.node(node, NodeRule::new("true"));
            }
        });
    }

    with_timeout(task.run(&host(), &[])).await?;

    assert_eq!(
        *hook_args.lock().unwrap(),
        vec![(vec!["gen".to_string()], Vec::<String>::new())]
    );
    match &executor.calls()[1] {
        ExecutorCall::Build { rules, .. } => assert_eq!(rules, &vec!["gen".to_string()]),
        other => panic!("expected build call, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn handlers_run_in_subscription_order() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    let order = Arc::new(Mutex::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        task.on(EventKind::End, move |_| order.lock().unwrap().push(label));
    }

    with_timeout(task.run(&host(), &[])).await?;

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    Ok(())
}

#[tokio::test]
async fn task_can_be_run_again() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(registering(&["gen"], &[]));
    let events = record_events(&task);
    let host = host();

    with_timeout(task.run(&host, &[])).await?;
    let second = with_timeout(task.run(&host, &[])).await?;

    // Second run hits the shared cache.
    assert!(second.built_targets.is_empty());
    assert_eq!(events.lock().unwrap().len(), 8);
    assert_eq!(executor.build_requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn failing_discovery_aborts_slow_siblings() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new();
    let task = task_with(&executor);
    task.prebuild(discovery_fn(|matcher, _span| async move {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        matcher.register_node("never");
        Ok(())
    }));
    task.prebuild(failing("fast failure"));

    let err = with_timeout(task.run(&host(), &[])).await.unwrap_err();

    assert!(format!("{err}").contains("fast failure"));
    Ok(())
}
