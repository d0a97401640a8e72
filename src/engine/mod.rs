// src/engine/mod.rs

//! Orchestration engine for treerun.
//!
//! This module ties together:
//! - the pure scheduling core ([`crate::dag::Scheduler`])
//! - the async runtime loop that runs package tasks and feeds their outcomes
//!   back into the core ([`runtime`])
//! - the shared abort signal ([`abort`])
//! - the final per-package report ([`report`])

use std::sync::Arc;

use crate::dag::{PackageGraph, Scheduler, SchedulerOptions, WorkingSet};
use crate::errors::Result;
use crate::exec::PackageTask;

/// Canonical package name type used throughout the engine.
pub type PackageName = String;

/// Outcome of a package task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Exit code of the task, or `-1` when it died from a signal or could not
    /// be run at all.
    Failed(i32),
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Completion message sent by a package task back to the runtime loop.
#[derive(Debug, Clone)]
pub struct Completion {
    pub package: PackageName,
    pub outcome: TaskOutcome,
}

pub mod abort;
pub mod report;
pub mod runtime;

pub use abort::{spawn_interrupt_handler, AbortController, AbortReason};
pub use report::RunReport;
pub use runtime::Runtime;

/// Run `task` over `working_set` in dependency order.
///
/// Task failures end up in the returned [`RunReport`]; only configuration
/// errors (cycles, zero parallelism, unknown packages) are returned as `Err`.
pub async fn run_packages(
    graph: &PackageGraph,
    working_set: &WorkingSet,
    task: Arc<dyn PackageTask>,
    options: SchedulerOptions,
    abort: AbortController,
) -> Result<RunReport> {
    let scheduler = Scheduler::new(graph, working_set, options, abort.clone())?;
    Runtime::new(scheduler, task, abort).run().await
}
