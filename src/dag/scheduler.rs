use tracing::{debug, info, warn};

use crate::dag::graph::PackageGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::RunState;
use crate::dag::working_set::WorkingSet;
use crate::engine::{AbortController, AbortReason, RunReport, TaskOutcome};
use crate::errors::{Result, TreerunError};
use crate::types::PackageStatus;

/// Knobs for one scheduler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of packages running at once. Must be >= 1.
    pub parallelism: usize,
    /// Keep scheduling unrelated packages after a failure instead of aborting.
    pub force: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            force: false,
        }
    }
}

/// Synchronous, deterministic scheduling core for one run.
///
/// It owns the per-run [`RunState`] and decides, after every event, which
/// packages start next. It never runs anything itself: the async shell
/// (`engine::Runtime`) executes `newly_started` packages and feeds their
/// outcomes back through [`Scheduler::step_completion`].
///
/// Rules:
/// - a package starts only once all of its in-set dependencies succeeded
/// - at most `parallelism` packages are running at any time
/// - ready packages start in discovery order
/// - a failed package skips its pending dependents, always
/// - without `force`, a failure aborts the shared [`AbortController`]; once
///   aborted, every pending package is skipped and nothing new starts, while
///   running packages are left to finish
#[derive(Debug)]
pub struct Scheduler {
    state: RunState,
    options: SchedulerOptions,
    abort: AbortController,
    running: usize,
    finished: bool,
}

impl Scheduler {
    /// Prepare a run of `working_set`.
    ///
    /// Fails with a configuration error if `parallelism` is zero, if the set
    /// names an unknown package, or if the set contains a dependency cycle.
    pub fn new(
        graph: &PackageGraph,
        working_set: &WorkingSet,
        options: SchedulerOptions,
        abort: AbortController,
    ) -> Result<Self> {
        if options.parallelism == 0 {
            return Err(TreerunError::InvalidParallelism(options.parallelism));
        }

        let state = RunState::new(graph, working_set)?;

        check_cycles(graph, working_set)?;

        debug!(
            packages = working_set.len(),
            parallelism = options.parallelism,
            force = options.force,
            "scheduler prepared"
        );

        Ok(Self {
            state,
            options,
            abort,
            running: 0,
            finished: false,
        })
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Number of packages currently running.
    pub fn running(&self) -> usize {
        self.running
    }

    /// Whether every package has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.state.all_terminal()
    }

    pub fn status_of(&self, package: &str) -> Option<PackageStatus> {
        self.state.status_of(package)
    }

    /// Whether the in-set dependencies of `package` have all succeeded.
    ///
    /// Returns `None` if the package is not part of this run.
    pub fn deps_satisfied(&self, package: &str) -> Option<bool> {
        self.state.deps_satisfied(package)
    }

    /// Start the run: schedule the first batch of ready packages.
    pub fn start(&mut self) -> Result<SchedulerStep> {
        info!(
            packages = self.state.count(PackageStatus::Pending),
            parallelism = self.options.parallelism,
            "starting run"
        );
        let mut step = SchedulerStep::default();
        self.dispatch(&mut step)?;
        Ok(step)
    }

    /// Record the outcome of a running package and schedule what it unblocked.
    ///
    /// Completions for packages that are not running are ignored.
    pub fn step_completion(&mut self, package: &str, outcome: TaskOutcome) -> Result<SchedulerStep> {
        let mut step = SchedulerStep::default();

        if self.state.status_of(package) != Some(PackageStatus::Running) {
            warn!(package = %package, "completion for a package that is not running; ignoring");
            return Ok(step);
        }
        self.running -= 1;

        match outcome {
            TaskOutcome::Success => {
                info!(package = %package, "package succeeded");
                self.state.set_status(package, PackageStatus::Succeeded);
            }
            TaskOutcome::Failed(code) => {
                warn!(
                    package = %package,
                    exit_code = code,
                    force = self.options.force,
                    "package failed; skipping its dependents"
                );
                self.state.set_status(package, PackageStatus::Failed);
                step.newly_failed.push(package.to_string());
                step.newly_skipped
                    .extend(self.state.mark_dependents_skipped(package));

                if !self.options.force {
                    self.abort.abort(AbortReason::TaskFailed {
                        package: package.to_string(),
                    });
                }
            }
        }

        self.dispatch(&mut step)?;
        Ok(step)
    }

    /// React to the shared abort signal (e.g. a user interrupt).
    pub fn step_abort(&mut self) -> Result<SchedulerStep> {
        let mut step = SchedulerStep::default();
        self.dispatch(&mut step)?;
        Ok(step)
    }

    /// Final statuses, in discovery order.
    pub fn report(&self) -> RunReport {
        RunReport::new(self.state.snapshot(), self.abort.reason())
    }

    /// Start ready packages into free slots, or skip everything pending once
    /// the run is aborted.
    fn dispatch(&mut self, step: &mut SchedulerStep) -> Result<()> {
        if self.abort.is_aborted() {
            let skipped = self.state.skip_all_pending();
            if !skipped.is_empty() {
                warn!(
                    ?skipped,
                    running = self.running,
                    "run aborted; skipping pending packages and waiting for running ones"
                );
            }
            step.newly_skipped.extend(skipped);
        } else {
            let free = self.options.parallelism.saturating_sub(self.running);
            for name in self.state.ready(free) {
                self.state.set_status(&name, PackageStatus::Running);
                self.running += 1;
                if let Some(package) = self.state.package(&name) {
                    info!(package = %name, running = self.running, "starting package");
                    step.newly_started.push(package.clone());
                }
            }
        }

        if self.running == 0 && self.state.count(PackageStatus::Pending) > 0 {
            // Nothing can ever unblock the remaining packages.
            let stuck = self.state.names_with(PackageStatus::Pending);
            warn!(?stuck, "no package is ready or running; dependency cycle");
            return Err(TreerunError::DependencyCycle(vec![stuck]));
        }

        if !self.finished && self.state.all_terminal() {
            self.finished = true;
            step.run_just_finished = true;
            info!(
                succeeded = self.state.count(PackageStatus::Succeeded),
                failed = self.state.count(PackageStatus::Failed),
                skipped = self.state.count(PackageStatus::Skipped),
                "run finished"
            );
        }

        Ok(())
    }
}

/// Fail with [`TreerunError::DependencyCycle`] if packages of `working_set`
/// depend on each other in a loop.
pub fn check_cycles(graph: &PackageGraph, working_set: &WorkingSet) -> Result<()> {
    let cycles = graph.cycles_within(working_set.names());
    if cycles.is_empty() {
        return Ok(());
    }
    warn!(?cycles, "dependency cycle between selected packages");
    Err(TreerunError::DependencyCycle(cycles))
}
