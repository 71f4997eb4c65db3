//! Tests for the progress tracker

use super::*;
use crate::report::Milestone;
use crate::workload::{TaskResult, UnitSnapshot, UnitState, WorkloadKind};

use std::sync::Arc;

fn cells(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("cell-{i}")).collect()
}

fn running(guid: &str, index: u32, cell: &str) -> UnitSnapshot {
    UnitSnapshot::new(guid, UnitState::Running)
        .with_index(index)
        .on_node(cell)
}

fn lrp_tracker(target: usize, nodes: usize) -> ProgressTracker {
    ProgressTracker::new(
        WorkloadKind::LongRunningProcess,
        format!("Running {target} Instances Across {nodes} Cells"),
        target,
        &cells(nodes),
    )
}

// ============================================================================
// Observation semantics
// ============================================================================

#[test]
fn test_observe_is_idempotent() {
    let tracker = lrp_tracker(3, 2);
    let snapshot = vec![
        running("guid", 0, "cell-0"),
        UnitSnapshot::new("guid", UnitState::Claimed)
            .with_index(1)
            .on_node("cell-1"),
        UnitSnapshot::new("guid", UnitState::Unclaimed).with_index(2),
    ];

    tracker.observe(&snapshot);
    let after_first = tracker.snapshot();

    tracker.observe(&snapshot);
    let after_second = tracker.snapshot();

    assert_eq!(after_first.time_to_claimed, after_second.time_to_claimed);
    assert_eq!(after_first.time_to_running, after_second.time_to_running);
    assert_eq!(after_first.distribution, after_second.distribution);
    assert_eq!(after_second.time_to_claimed.len(), 2);
    assert_eq!(after_second.time_to_running.len(), 1);
}

#[test]
fn test_first_observation_wins() {
    let tracker = lrp_tracker(1, 1);

    tracker.observe(&[UnitSnapshot::new("guid", UnitState::Claimed)
        .with_index(0)
        .on_node("cell-0")]);
    let claimed_at = tracker.snapshot().time_to_claimed["guid/0"];

    std::thread::sleep(std::time::Duration::from_millis(5));
    tracker.observe(&[running("guid", 0, "cell-0")]);

    let report = tracker.snapshot();
    assert_eq!(report.time_to_claimed["guid/0"], claimed_at);
    assert!(report.time_to_running["guid/0"] > claimed_at);
}

#[test]
fn test_running_implies_claimed() {
    let tracker = lrp_tracker(1, 1);
    tracker.observe(&[running("guid", 0, "cell-0")]);

    let report = tracker.snapshot();
    assert_eq!(
        report.time_to_claimed["guid/0"],
        report.time_to_running["guid/0"]
    );
}

#[test]
fn test_batching_and_order_do_not_change_outcome() {
    let observations: Vec<UnitSnapshot> = (0..6)
        .map(|i| running("guid", i, &format!("cell-{}", i % 3)))
        .collect();

    let all_at_once = lrp_tracker(6, 3);
    all_at_once.observe(&observations);

    let reversed_singly = lrp_tracker(6, 3);
    for snapshot in observations.iter().rev() {
        reversed_singly.observe(std::slice::from_ref(snapshot));
    }

    let in_pairs = lrp_tracker(6, 3);
    for chunk in observations.chunks(2) {
        in_pairs.observe(chunk);
        in_pairs.observe(chunk);
    }

    let expected = all_at_once.snapshot();
    for tracker in [&reversed_singly, &in_pairs] {
        let report = tracker.snapshot();
        assert_eq!(
            report.time_to_running.keys().collect::<Vec<_>>(),
            expected.time_to_running.keys().collect::<Vec<_>>()
        );
        assert_eq!(report.distribution, expected.distribution);
        assert_eq!(report.placements, expected.placements);
    }
}

#[test]
fn test_target_reached_only_with_all_units() {
    let tracker = lrp_tracker(10, 2);
    let nine: Vec<UnitSnapshot> = (0..9).map(|i| running("guid", i, "cell-0")).collect();

    for _ in 0..5 {
        assert!(!tracker.observe(&nine));
    }
    assert!(!tracker.is_satisfied());

    let mut ten = nine.clone();
    ten.push(running("guid", 9, "cell-1"));
    assert!(tracker.observe(&ten));
    assert!(tracker.is_satisfied());
    assert_eq!(tracker.terminal_count(), 10);
}

#[test]
fn test_claimed_units_do_not_satisfy_lrp_target() {
    let tracker = lrp_tracker(2, 1);
    let claimed: Vec<UnitSnapshot> = (0..2)
        .map(|i| {
            UnitSnapshot::new("guid", UnitState::Claimed)
                .with_index(i)
                .on_node("cell-0")
        })
        .collect();

    assert!(!tracker.observe(&claimed));
}

#[test]
fn test_distribution_counts_each_unit_once() {
    let tracker = lrp_tracker(2, 2);

    for _tick in 0..3 {
        tracker.observe(&[running("guid", 0, "cell-0")]);
    }

    let report = tracker.snapshot();
    assert_eq!(report.distribution["cell-0"], 1);
    assert_eq!(report.distribution["cell-1"], 0);
}

#[test]
fn test_idle_nodes_appear_in_summary() {
    let tracker = lrp_tracker(1, 3);
    tracker.observe(&[running("guid", 0, "cell-2")]);

    let summary = tracker.summary();
    assert_eq!(
        summary.distribution,
        vec![
            ("cell-0".to_string(), 0),
            ("cell-1".to_string(), 0),
            ("cell-2".to_string(), 1)
        ]
    );
}

#[test]
fn test_placement_without_node_is_not_counted() {
    let tracker = lrp_tracker(1, 1);
    tracker.observe(&[UnitSnapshot::new("guid", UnitState::Claimed).with_index(0)]);
    tracker.observe(&[running("guid", 0, "cell-0")]);

    let report = tracker.snapshot();
    assert_eq!(report.distribution["cell-0"], 1);
    assert_eq!(report.placements["guid/0"], "cell-0");
}

#[test]
fn test_polled_task_failures_are_recorded() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "polled tasks", 2, &cells(1));
    let done = tracker.observe(&[
        UnitSnapshot::new("t-0", UnitState::Completed).on_node("cell-0"),
        UnitSnapshot::new(
            "t-1",
            UnitState::Failed {
                reason: "exit status 2".into(),
            },
        )
        .on_node("cell-0"),
    ]);

    assert!(done);
    let report = tracker.snapshot();
    assert_eq!(report.failures["t-1"], "exit status 2");
    assert_eq!(report.distribution["cell-0"], 2);
}

// ============================================================================
// Push completions and outcome accounting
// ============================================================================

#[test]
fn test_completed_is_first_wins() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "tasks", 1, &cells(1));

    assert!(tracker.completed(&TaskResult::succeeded("t-0")));
    assert!(!tracker.completed(&TaskResult::failed("t-0", "late duplicate")));

    let report = tracker.snapshot();
    assert!(report.failures.is_empty());
    assert_eq!(report.time_to_complete.len(), 1);
}

#[test]
fn test_completed_with_cell_records_placement() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "tasks", 1, &cells(2));
    tracker.completed(&TaskResult::succeeded("t-0").on_cell("cell-1"));

    assert_eq!(tracker.snapshot().distribution["cell-1"], 1);
}

#[test]
fn test_failure_accounting_divides_by_target() {
    let tracker = ProgressTracker::new(
        WorkloadKind::Task,
        "Running 5 Tasks Across 1 Cells",
        5,
        &cells(1),
    );
    for i in 0..5 {
        tracker.record_created(&format!("t-{i}"));
    }
    tracker.completed(&TaskResult::succeeded("t-0"));
    tracker.completed(&TaskResult::succeeded("t-1"));
    tracker.completed(&TaskResult::failed("t-2", "out of memory"));

    let summary = tracker.summary();
    let outcome = summary.outcome.as_ref().unwrap();

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.never_completed, 2);
    assert!((outcome.percent_succeeded() - 40.0).abs() < 1e-9);
    assert!((outcome.percent_failed() - 20.0).abs() < 1e-9);
    assert!((outcome.percent_never_completed() - 40.0).abs() < 1e-9);

    let text = summary.to_string();
    assert!(text.contains("Of 5 Tasks:"));
    assert!(text.contains("2 (40.00%) Succeeded"));
    assert!(text.contains("1 (20.00%) Failed"));
    assert!(text.contains("t-2: out of memory"));
    assert!(text.contains("2 (40.00%) Never Completed"));
}

#[test]
fn test_zero_target_reports_zero_percent() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "empty", 0, &[]);

    assert!(tracker.is_satisfied());
    let summary = tracker.summary();
    let outcome = summary.outcome.as_ref().unwrap();
    assert_eq!(outcome.percent_succeeded(), 0.0);
    assert_eq!(outcome.percent_never_completed(), 0.0);
    assert!(summary.to_string().contains("0 (0.00%) Succeeded"));
}

#[test]
fn test_lrp_summary_has_no_outcome() {
    let tracker = lrp_tracker(1, 1);
    tracker.observe(&[running("guid", 0, "cell-0")]);

    let summary = tracker.summary();
    assert!(summary.outcome.is_none());
    assert_eq!(summary.timing(Milestone::Running).unwrap().count, 1);
    assert!(summary.timing(Milestone::Completed).is_none());

    let text = summary.to_string();
    assert!(text.contains("Claim time stats (in seconds)"));
    assert!(text.contains("Running time stats (in seconds)"));
    assert!(text.contains("Distribution:"));
    assert!(text.contains("cell-0 +"));
}

#[test]
fn test_record_carries_kind() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "tasks", 1, &cells(1));
    tracker.record_created("t-0");

    let record = tracker.record();
    assert_eq!(record.kind, WorkloadKind::Task);
    assert_eq!(record.summary(), tracker.summary());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_lose_no_updates() {
    let tracker = Arc::new(lrp_tracker(100, 4));

    let mut handles = Vec::with_capacity(200);
    for i in 0..100u32 {
        let creator = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            creator.record_created(&format!("guid/{i}"));
        }));

        let observer = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            let cell = format!("cell-{}", i % 4);
            observer.observe(&[running("guid", i, &cell), running("guid", i, &cell)]);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let report = tracker.snapshot();
    assert_eq!(report.time_to_create.len(), 100);
    assert_eq!(report.time_to_running.len(), 100);
    assert_eq!(report.distribution.values().sum::<usize>(), 100);
    assert!(report.distribution.values().all(|count| *count == 25));
    assert!(tracker.is_satisfied());
}

#[test]
fn test_concurrent_completions_from_threads() {
    let tracker = ProgressTracker::new(WorkloadKind::Task, "threads", 50, &cells(1));

    std::thread::scope(|scope| {
        for worker in 0..10 {
            let tracker = &tracker;
            scope.spawn(move || {
                // Every task is delivered twice by different threads.
                for i in 0..50 {
                    if i % 10 == worker || (i + 1) % 10 == worker {
                        tracker.completed(&TaskResult::succeeded(format!("t-{i}")));
                    }
                }
            });
        }
    });

    assert_eq!(tracker.terminal_count(), 50);
    assert!(tracker.is_satisfied());
}
