// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::package::Package;
use crate::engine::PackageName;

/// Structured result of a single scheduler "step".
///
/// The async runtime only looks at `newly_started`; tests use the rest to
/// step the scheduler by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Packages moved to `Running`; the caller must run their task now.
    pub newly_started: Vec<Package>,
    /// Packages that were marked as failed in this step.
    pub newly_failed: Vec<PackageName>,
    /// Packages that were marked as skipped in this step.
    pub newly_skipped: Vec<PackageName>,
    /// Whether this step ended the run (no package pending or running).
    pub run_just_finished: bool,
}

impl SchedulerStep {
    pub fn started_names(&self) -> Vec<&str> {
        self.newly_started.iter().map(|p| p.name.as_str()).collect()
    }
}
