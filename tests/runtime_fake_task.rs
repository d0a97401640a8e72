// tests/runtime_fake_task.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use treerun::dag::{PackageGraph, SchedulerOptions, WorkingSet};
use treerun::engine::{run_packages, AbortController, AbortReason, RunReport};
use treerun::errors::TreerunError;
use treerun::types::PackageStatus;
use treerun_test_utils::builders::{fan_out_graph, GraphBuilder};
use treerun_test_utils::fake_task::{FakeTask, TaskEvent};
use treerun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

async fn run_all(
    graph: &PackageGraph,
    task: &Arc<FakeTask>,
    parallelism: usize,
    force: bool,
    abort: AbortController,
) -> treerun::errors::Result<RunReport> {
    with_timeout(run_packages(
        graph,
        &WorkingSet::all(graph),
        task.clone(),
        SchedulerOptions { parallelism, force },
        abort,
    ))
    .await
}

fn position(events: &[TaskEvent], wanted: &TaskEvent) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("event {wanted:?} not found in {events:?}"))
}

#[tokio::test]
async fn fan_out_runs_root_first_then_dependents_concurrently() -> TestResult {
    init_tracing();

    let graph = fan_out_graph();
    let task = Arc::new(FakeTask::new().default_delay(Duration::from_millis(20)));

    let report = run_all(&graph, &task, 2, false, AbortController::new()).await?;

    assert!(report.is_success());
    assert_eq!(report.succeeded(), vec!["A", "B", "C"]);

    let events = task.events();
    let a_done = position(&events, &TaskEvent::Finished("A".into()));
    assert!(a_done < position(&events, &TaskEvent::Started("B".into())));
    assert!(a_done < position(&events, &TaskEvent::Started("C".into())));
    // B and C overlap.
    assert!(
        position(&events, &TaskEvent::Started("C".into()))
            < position(&events, &TaskEvent::Finished("B".into()))
    );
    assert_eq!(task.max_concurrency(), 2);
    Ok(())
}

#[tokio::test]
async fn root_failure_skips_dependents() -> TestResult {
    init_tracing();

    let graph = fan_out_graph();
    let task = Arc::new(FakeTask::new().fail("A", 1));
    let abort = AbortController::new();

    let report = run_all(&graph, &task, 2, false, abort.clone()).await?;

    assert_eq!(report.status_of("A"), Some(PackageStatus::Failed));
    assert_eq!(report.skipped(), vec!["B", "C"]);
    assert_eq!(task.started(), vec!["A"]);
    assert!(abort.is_aborted());
    assert_eq!(report.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn root_failure_skips_dependents_under_force() -> TestResult {
    init_tracing();

    let graph = fan_out_graph();
    let task = Arc::new(FakeTask::new().fail("A", 1));
    let abort = AbortController::new();

    let report = run_all(&graph, &task, 2, true, abort.clone()).await?;

    assert_eq!(report.failed(), vec!["A"]);
    assert_eq!(report.skipped(), vec!["B", "C"]);
    assert_eq!(task.started(), vec!["A"]);
    assert!(!abort.is_aborted());
    Ok(())
}

#[tokio::test]
async fn force_runs_everything_not_downstream_of_a_failure() -> TestResult {
    init_tracing();

    let graph = GraphBuilder::new()
        .package("A", &[])
        .package("B", &[])
        .package("C", &["B"])
        .package("D", &["A"])
        .build();
    let task = Arc::new(FakeTask::new().fail("A", 3));

    let report = run_all(&graph, &task, 1, true, AbortController::new()).await?;

    assert_eq!(report.failed(), vec!["A"]);
    assert_eq!(report.succeeded(), vec!["B", "C"]);
    assert_eq!(report.skipped(), vec!["D"]);
    Ok(())
}

#[tokio::test]
async fn failure_without_force_starts_nothing_new() -> TestResult {
    init_tracing();

    // A fails quickly while X is still running; Y (after X) must never start.
    let graph = GraphBuilder::new()
        .package("A", &[])
        .package("X", &[])
        .package("Y", &["X"])
        .build();
    let task = Arc::new(
        FakeTask::new()
            .fail("A", 1)
            .delay("X", Duration::from_millis(50)),
    );

    let report = run_all(&graph, &task, 2, false, AbortController::new()).await?;

    assert_eq!(report.status_of("X"), Some(PackageStatus::Succeeded));
    assert_eq!(report.status_of("Y"), Some(PackageStatus::Skipped));
    let mut started = task.started();
    started.sort();
    assert_eq!(started, vec!["A", "X"]);
    assert_eq!(
        report.abort_reason(),
        Some(&AbortReason::TaskFailed {
            package: "A".to_string()
        })
    );
    Ok(())
}

#[tokio::test]
async fn concurrency_never_exceeds_parallelism() -> TestResult {
    init_tracing();

    let mut builder = GraphBuilder::new();
    for i in 0..8 {
        builder = builder.package(&format!("p{i}"), &[]);
    }
    let graph = builder.build();
    let task = Arc::new(FakeTask::new().default_delay(Duration::from_millis(10)));

    let report = run_all(&graph, &task, 3, false, AbortController::new()).await?;

    assert!(report.is_success());
    assert_eq!(task.max_concurrency(), 3);
    Ok(())
}

#[tokio::test]
async fn user_interrupt_lets_running_work_finish_and_skips_the_rest() -> TestResult {
    init_tracing();

    let graph = GraphBuilder::new()
        .package("A", &[])
        .package("B", &["A"])
        .package("C", &[])
        .build();
    let task = Arc::new(FakeTask::new().gate("A"));
    let abort = AbortController::new();

    let run = {
        let graph = graph.clone();
        let task = task.clone();
        let abort = abort.clone();
        tokio::spawn(async move { run_all(&graph, &task, 1, false, abort).await })
    };

    with_timeout(task.wait_until_started("A")).await;
    abort.abort(AbortReason::UserInitiated);
    // Give the runtime a chance to observe the abort before A completes.
    tokio::time::sleep(Duration::from_millis(20)).await;
    task.open_gate("A");

    let report = run.await??;

    assert_eq!(report.status_of("A"), Some(PackageStatus::Succeeded));
    assert_eq!(report.skipped(), vec!["B", "C"]);
    assert_eq!(report.abort_reason(), Some(&AbortReason::UserInitiated));
    assert_eq!(task.started(), vec!["A"]);
    Ok(())
}

#[tokio::test]
async fn panicking_task_counts_as_failure() -> TestResult {
    init_tracing();

    let graph = fan_out_graph();
    let task = Arc::new(FakeTask::new().panic_on("A"));

    let report = run_all(&graph, &task, 2, false, AbortController::new()).await?;

    assert_eq!(report.failed(), vec!["A"]);
    assert_eq!(report.skipped(), vec!["B", "C"]);
    Ok(())
}

#[tokio::test]
async fn cycle_fails_fast_instead_of_hanging() {
    init_tracing();

    let graph = GraphBuilder::new()
        .package("A", &["B"])
        .package("B", &["A"])
        .build();
    let task = Arc::new(FakeTask::new());

    let result = run_all(&graph, &task, 2, false, AbortController::new()).await;

    assert!(matches!(result, Err(TreerunError::DependencyCycle(_))));
    assert!(task.started().is_empty());
}

#[tokio::test]
async fn already_aborted_controller_runs_nothing() -> TestResult {
    init_tracing();

    let graph = fan_out_graph();
    let task = Arc::new(FakeTask::new());
    let abort = AbortController::new();
    abort.abort(AbortReason::UserInitiated);

    let report = run_all(&graph, &task, 2, false, abort).await?;

    assert_eq!(report.skipped(), vec!["A", "B", "C"]);
    assert!(task.started().is_empty());
    Ok(())
}
