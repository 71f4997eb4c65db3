//! Tests for the completion watchers

use super::*;
use crate::error::FezzikError;
use crate::test_support::FakeOrchestrator;
use crate::tracker::ProgressTracker;
use crate::workload::{TaskResult, UnitSnapshot, UnitState, WorkloadKind};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn cells() -> Vec<String> {
    vec!["cell-0".to_string(), "cell-1".to_string()]
}

fn lrp_tracker(target: usize) -> Arc<ProgressTracker> {
    Arc::new(ProgressTracker::new(
        WorkloadKind::LongRunningProcess,
        format!("Running {target} Instances Across 2 Cells"),
        target,
        &cells(),
    ))
}

fn task_tracker(target: usize) -> Arc<ProgressTracker> {
    Arc::new(ProgressTracker::new(
        WorkloadKind::Task,
        format!("Running {target} Tasks Across 2 Cells"),
        target,
        &cells(),
    ))
}

fn replica(index: u32, state: UnitState) -> UnitSnapshot {
    let snapshot = UnitSnapshot::new("lrp", state).with_index(index);
    if snapshot.state.is_placed() {
        snapshot.on_node(format!("cell-{}", index % 2))
    } else {
        snapshot
    }
}

fn done_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(COMPLETION_PATH)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn result_json(result: &TaskResult) -> String {
    serde_json::to_string(result).unwrap()
}

// ============================================================================
// PollWatcher
// ============================================================================

#[tokio::test]
async fn test_poll_watcher_reaches_done() {
    let client = Arc::new(FakeOrchestrator::new(&["cell-0", "cell-1"]));
    client.push_snapshot(vec![
        replica(0, UnitState::Unclaimed),
        replica(1, UnitState::Unclaimed),
    ]);
    client.push_snapshot(vec![
        replica(0, UnitState::Claimed),
        replica(1, UnitState::Running),
    ]);
    client.push_snapshot(vec![
        replica(0, UnitState::Running),
        replica(1, UnitState::Running),
    ]);

    let tracker = lrp_tracker(2);
    let watcher = PollWatcher::new(client.clone(), Arc::clone(&tracker), "fezzik")
        .with_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(5));

    let report = watcher.run().await.unwrap();

    assert_eq!(report.state, WatchState::Done);
    assert_eq!(report.observed, 2);
    assert_eq!(report.target, 2);
    assert_eq!(client.snapshot_calls.load(Ordering::SeqCst), 3);

    let state = tracker.snapshot();
    assert_eq!(state.time_to_running.len(), 2);
    assert_eq!(state.distribution["cell-0"], 1);
    assert_eq!(state.distribution["cell-1"], 1);
}

#[tokio::test]
async fn test_poll_watcher_times_out_with_partial_progress() {
    let client = Arc::new(FakeOrchestrator::new(&["cell-0", "cell-1"]));
    client.push_snapshot(vec![
        replica(0, UnitState::Running),
        replica(1, UnitState::Crashed),
    ]);

    let tracker = lrp_tracker(2);
    let watcher = PollWatcher::new(client, Arc::clone(&tracker), "fezzik")
        .with_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_millis(60));

    let err = watcher.run().await.unwrap_err();

    assert!(err.is_timeout());
    match err {
        FezzikError::Timeout {
            observed, target, ..
        } => {
            assert_eq!(observed, 1);
            assert_eq!(target, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tracker.snapshot().time_to_running.len(), 1);
}

#[tokio::test]
async fn test_poll_watcher_fetch_error_is_fatal() {
    let client = Arc::new(FakeOrchestrator::new(&["cell-0"]));
    client.push_snapshot(vec![replica(0, UnitState::Claimed)]);
    client.push_snapshot_error("connection reset by peer");

    let watcher = PollWatcher::new(client.clone(), lrp_tracker(1), "fezzik")
        .with_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(5));

    let err = watcher.run().await.unwrap_err();

    assert!(matches!(err, FezzikError::Observation(ref m) if m.contains("connection reset")));
    assert_eq!(client.snapshot_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_poll_watcher_zero_target_finishes_on_first_poll() {
    let client = Arc::new(FakeOrchestrator::new(&["cell-0"]));
    let watcher = PollWatcher::new(client, lrp_tracker(0), "fezzik")
        .with_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(1));

    let report = watcher.run().await.unwrap();
    assert_eq!(report.state, WatchState::Done);
    assert_eq!(report.observed, 0);
}

#[test]
fn test_poll_watcher_from_config() {
    let config = crate::config::ScenarioConfig::default()
        .with_poll_interval(Duration::from_millis(50))
        .with_timeout(Duration::from_secs(9));
    let watcher = PollWatcher::from_config(
        Arc::new(FakeOrchestrator::new(&[])),
        lrp_tracker(1),
        "fezzik",
        &config,
    );

    let debug = format!("{:?}", watcher);
    assert!(debug.contains("50ms"));
    assert!(debug.contains("9s"));
}

// ============================================================================
// PushWatcher endpoint
// ============================================================================

#[tokio::test]
async fn test_push_endpoint_records_completion() {
    let tracker = task_tracker(2);
    let watcher = PushWatcher::new(Arc::clone(&tracker));

    let body = result_json(&TaskResult::succeeded("task-0").on_cell("cell-1"));
    let response = watcher.router().oneshot(done_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(watcher.received(), 1);
    assert_eq!(watcher.state(), WatchState::Listening);

    let state = tracker.snapshot();
    assert!(state.time_to_complete.contains_key("task-0"));
    assert_eq!(state.distribution["cell-1"], 1);
}

#[tokio::test]
async fn test_push_endpoint_counts_distinct_completions() {
    let tracker = task_tracker(2);
    let watcher = PushWatcher::new(Arc::clone(&tracker));
    let body = result_json(&TaskResult::succeeded("task-0"));

    for _ in 0..3 {
        let response = watcher
            .router()
            .oneshot(done_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(watcher.received(), 1);
    assert_eq!(tracker.terminal_count(), 1);
}

#[tokio::test]
async fn test_push_endpoint_records_failure_reason() {
    let tracker = task_tracker(1);
    let watcher = PushWatcher::new(Arc::clone(&tracker));

    let body = result_json(&TaskResult::failed("task-0", "exit status 1"));
    watcher.router().oneshot(done_request(body)).await.unwrap();

    assert_eq!(watcher.state(), WatchState::Done);
    assert_eq!(tracker.snapshot().failures["task-0"], "exit status 1");
}

#[tokio::test]
async fn test_push_endpoint_rejects_bad_body() {
    let watcher = PushWatcher::new(task_tracker(1)).with_timeout(Duration::from_secs(5));

    let response = watcher
        .router()
        .oneshot(done_request("{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let err = watcher.wait().await.unwrap_err();
    assert!(matches!(err, FezzikError::Notification(_)));
}

#[tokio::test]
async fn test_push_endpoint_only_accepts_post() {
    let watcher = PushWatcher::new(task_tracker(1));
    let request = Request::builder()
        .method("GET")
        .uri(COMPLETION_PATH)
        .body(Body::empty())
        .unwrap();

    let response = watcher.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// PushWatcher wait
// ============================================================================

#[tokio::test]
async fn test_push_wait_completes_when_all_arrive() {
    let watcher = PushWatcher::new(task_tracker(3)).with_timeout(Duration::from_secs(5));

    let sender = watcher.clone();
    let posts = tokio::spawn(async move {
        for i in 0..3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let body = result_json(&TaskResult::succeeded(format!("task-{i}")));
            sender.router().oneshot(done_request(body)).await.unwrap();
        }
    });

    let report = watcher.wait().await.unwrap();
    posts.await.unwrap();

    assert_eq!(report.state, WatchState::Done);
    assert_eq!(report.observed, 3);
    assert_eq!(report.target, 3);
}

#[tokio::test]
async fn test_push_wait_times_out() {
    let watcher = PushWatcher::new(task_tracker(2)).with_timeout(Duration::from_millis(30));

    let body = result_json(&TaskResult::succeeded("task-0"));
    watcher.router().oneshot(done_request(body)).await.unwrap();

    match watcher.wait().await.unwrap_err() {
        FezzikError::Timeout {
            observed, target, ..
        } => {
            assert_eq!(observed, 1);
            assert_eq!(target, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_push_lowered_expectation_releases_wait() {
    let watcher = PushWatcher::new(task_tracker(3)).with_timeout(Duration::from_secs(5));

    let body = result_json(&TaskResult::succeeded("task-0"));
    watcher.router().oneshot(done_request(body)).await.unwrap();

    let lowering = watcher.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        lowering.set_expected(1);
    });

    let report = watcher.wait().await.unwrap();
    assert_eq!(report.target, 1);
    assert_eq!(report.observed, 1);
}

#[tokio::test]
async fn test_push_serve_over_tcp() {
    let watcher = PushWatcher::new(task_tracker(1)).with_timeout(Duration::from_secs(5));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = watcher.clone();
    let serving = tokio::spawn(async move { server.serve(listener).await });

    let response = reqwest::Client::new()
        .post(format!("http://{addr}{COMPLETION_PATH}"))
        .json(&TaskResult::succeeded("task-0"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let report = watcher.wait().await.unwrap();
    assert_eq!(report.state, WatchState::Done);

    watcher.close();
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("server should stop after close")
        .unwrap()
        .unwrap();
}
