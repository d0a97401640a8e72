// src/exec/mod.rs

//! Package task execution layer.
//!
//! - [`backend`] provides the `PackageTask` trait the runtime calls for every
//!   started package, and the `TaskKind` describing what to run.
//! - [`task_runner`] holds `CommandTask`, the production implementation that
//!   runs processes with `tokio::process::Command`.

pub mod backend;
pub mod task_runner;

pub use backend::{PackageTask, TaskKind};
pub use task_runner::CommandTask;
