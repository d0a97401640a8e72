// tests/scheduler_properties.rs

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use treerun::dag::{Package, PackageGraph, Scheduler, SchedulerOptions, WorkingSet};
use treerun::engine::{AbortController, TaskOutcome};
use treerun::types::{Direction, PackageStatus};

// Package i may only depend on packages 0..i, which keeps the graph acyclic.
fn dag_strategy(max_packages: usize) -> impl Strategy<Value = PackageGraph> {
    (1..=max_packages).prop_flat_map(|count| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..count), count)
            .prop_map(|raw_deps| {
                let packages = raw_deps.into_iter().enumerate().map(|(i, candidates)| {
                    let mut package = Package::new(format!("pkg_{i:02}"), format!("pkgs/{i}"));
                    if i > 0 {
                        package.dependencies = candidates
                            .into_iter()
                            .map(|c| format!("pkg_{:02}", c % i))
                            .collect();
                    }
                    package
                });
                PackageGraph::new(packages)
            })
    })
}

struct Simulation {
    statuses: Vec<(String, PackageStatus)>,
    started: Vec<String>,
    max_running: usize,
    started_after_failure: bool,
}

/// Drive the scheduler by hand, completing one running package per step.
///
/// `picks` chooses which running package finishes next.
fn simulate(
    graph: &PackageGraph,
    failing: &HashSet<String>,
    picks: &[usize],
    parallelism: usize,
    force: bool,
) -> Simulation {
    let working_set = WorkingSet::all(graph);
    let mut scheduler = Scheduler::new(
        graph,
        &working_set,
        SchedulerOptions { parallelism, force },
        AbortController::new(),
    )
    .expect("acyclic graph");

    let mut running: Vec<String> = Vec::new();
    let mut started = Vec::new();
    let mut max_running = 0;
    let mut seen_failure = false;
    let mut started_after_failure = false;

    let first = scheduler.start().expect("start");
    for package in first.newly_started {
        assert_deps_succeeded(graph, &scheduler, &package.name);
        started.push(package.name.clone());
        running.push(package.name);
    }
    max_running = max_running.max(running.len());

    let mut step_no = 0;
    while !running.is_empty() {
        assert!(step_no < 1000, "simulation did not terminate");
        let idx = picks.get(step_no).copied().unwrap_or(0) % running.len();
        step_no += 1;

        let name = running.swap_remove(idx);
        let outcome = if failing.contains(&name) {
            TaskOutcome::Failed(1)
        } else {
            TaskOutcome::Success
        };

        let step = scheduler.step_completion(&name, outcome).expect("step");
        if !step.newly_started.is_empty() && seen_failure {
            started_after_failure = true;
        }
        if !outcome.is_success() {
            seen_failure = true;
        }
        for package in step.newly_started {
            assert_deps_succeeded(graph, &scheduler, &package.name);
            started.push(package.name.clone());
            running.push(package.name);
        }
        max_running = max_running.max(running.len());
    }

    assert!(scheduler.is_finished());
    Simulation {
        statuses: scheduler.report().statuses().to_vec(),
        started,
        max_running,
        started_after_failure,
    }
}

fn assert_deps_succeeded(graph: &PackageGraph, scheduler: &Scheduler, name: &str) {
    for dep in graph.dependencies_of(name) {
        assert_eq!(
            scheduler.status_of(dep),
            Some(PackageStatus::Succeeded),
            "{name} started before its dependency {dep} succeeded"
        );
    }
}

fn pick_failing(graph: &PackageGraph, indices: &[usize]) -> HashSet<String> {
    let names: Vec<&str> = graph.packages().map(|p| p.name.as_str()).collect();
    indices
        .iter()
        .map(|&i| names[i % names.len()].to_string())
        .collect()
}

proptest! {
    #[test]
    fn every_package_reaches_a_terminal_status(
        graph in dag_strategy(12),
        failing_idx in proptest::collection::vec(any::<usize>(), 0..4),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
        parallelism in 1usize..5,
        force in any::<bool>(),
    ) {
        let failing = pick_failing(&graph, &failing_idx);
        let sim = simulate(&graph, &failing, &picks, parallelism, force);

        prop_assert_eq!(sim.statuses.len(), graph.len());
        for (_, status) in &sim.statuses {
            prop_assert!(status.is_terminal());
        }
        let unique: BTreeSet<&String> = sim.started.iter().collect();
        prop_assert_eq!(unique.len(), sim.started.len(), "a package started twice");
    }

    #[test]
    fn running_count_never_exceeds_parallelism(
        graph in dag_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
        parallelism in 1usize..5,
    ) {
        let sim = simulate(&graph, &HashSet::new(), &picks, parallelism, false);

        prop_assert!(sim.max_running <= parallelism);
        prop_assert_eq!(sim.started.len(), graph.len());
        prop_assert!(sim.statuses.iter().all(|(_, s)| *s == PackageStatus::Succeeded));
    }

    #[test]
    fn without_force_nothing_starts_after_a_failure(
        graph in dag_strategy(12),
        failing_idx in proptest::collection::vec(any::<usize>(), 1..4),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
        parallelism in 1usize..5,
    ) {
        let failing = pick_failing(&graph, &failing_idx);
        let sim = simulate(&graph, &failing, &picks, parallelism, false);

        prop_assert!(!sim.started_after_failure);
    }

    #[test]
    fn with_force_only_dependents_of_failures_are_skipped(
        graph in dag_strategy(12),
        failing_idx in proptest::collection::vec(any::<usize>(), 0..4),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
        parallelism in 1usize..5,
    ) {
        let failing = pick_failing(&graph, &failing_idx);
        let sim = simulate(&graph, &failing, &picks, parallelism, true);

        let failed: BTreeSet<String> = sim
            .statuses
            .iter()
            .filter(|(_, s)| *s == PackageStatus::Failed)
            .map(|(n, _)| n.clone())
            .collect();
        let blocked = graph.transitive_closure(failed.iter().map(|n| n.as_str()), Direction::Dependents);

        for (name, status) in &sim.statuses {
            let expected = if failed.contains(name) {
                PackageStatus::Failed
            } else if blocked.contains(name) {
                PackageStatus::Skipped
            } else {
                PackageStatus::Succeeded
            };
            prop_assert_eq!(*status, expected, "unexpected status for {}", name);
        }
        prop_assert!(failed.iter().all(|n| failing.contains(n)));
    }
}
