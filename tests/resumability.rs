#![cfg(unix)]

mod common;

use common::{engine, init_tracing, run_to_end, ManifestBuilder};
use runqueue::state::StateStore;

#[tokio::test]
async fn completed_tasks_are_not_rerun_on_a_second_invocation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let manifest = ManifestBuilder::new()
        .named_task("count", "echo run >> runs.log")
        .build();

    let first = run_to_end(engine(&manifest, dir.path(), dir.path())).await;
    assert_eq!(first.completed, 1);

    // Same manifest, same workspace: the completed task is carried over.
    let second = run_to_end(engine(&manifest, dir.path(), dir.path())).await;
    assert_eq!(second.completed, 1);

    let log = std::fs::read_to_string(dir.path().join("runs.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
}

#[tokio::test]
async fn exhausted_tasks_stay_skipped_across_invocations() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let manifest = ManifestBuilder::new()
        .named_task("boom", "echo x >> attempts.log; exit 1")
        .retry_ceiling(2)
        .build();

    let first = run_to_end(engine(&manifest, dir.path(), dir.path())).await;
    assert_eq!(first.skipped, vec!["boom".to_string()]);

    let second = run_to_end(engine(&manifest, dir.path(), dir.path())).await;
    assert_eq!(second.completed, 0);
    assert_eq!(second.skipped, vec!["boom".to_string()]);

    // Both attempts happened in the first invocation; the second added none.
    let log = std::fs::read_to_string(dir.path().join("attempts.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[tokio::test]
async fn a_task_completing_on_retry_clears_its_failure_record() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    // Fails on the first attempt, succeeds once the marker file exists.
    let manifest = ManifestBuilder::new()
        .named_task("flappy", "if [ -f marker ]; then exit 0; else touch marker; exit 1; fi")
        .retry_ceiling(3)
        .build();

    let summary = run_to_end(engine(&manifest, dir.path(), dir.path())).await;
    assert_eq!(summary.completed, 1);
    assert!(summary.skipped.is_empty());

    let store = StateStore::load(dir.path()).unwrap();
    let state = store.state();
    assert!(state.is_completed("flappy"));
    assert!(!state.failed.contains_key("flappy"));
    assert_eq!(state.attempts_of("flappy"), 1);
}
