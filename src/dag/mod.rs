// src/dag/mod.rs

//! Package graph, selection and scheduling.
//!
//! - [`package`] is the package model.
//! - [`graph`] holds the packages and their local dependency edges.
//! - [`selector`] computes the working set from include/exclude patterns and
//!   transitive expansion.
//! - [`working_set`] is the selected subset of packages.
//! - [`state_manager`] tracks per-run package statuses.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   packages start, and when.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod graph;
pub mod package;
pub mod scheduler;
pub mod scheduler_step;
pub mod selector;
pub mod state_manager;
pub mod working_set;

pub use graph::PackageGraph;
pub use package::Package;
pub use scheduler::{check_cycles, Scheduler, SchedulerOptions};
pub use scheduler_step::SchedulerStep;
pub use selector::{SelectionOptions, Selector};
pub use state_manager::RunState;
pub use working_set::WorkingSet;
