// src/exec/backend.rs

//! Pluggable package task abstraction.
//!
//! The runtime talks to a `PackageTask` instead of spawning processes itself.
//! This makes it easy to swap in a fake task in tests while keeping the
//! production implementation in [`task_runner`](super::task_runner).

use std::future::Future;
use std::pin::Pin;

use crate::dag::Package;
use crate::engine::TaskOutcome;

/// The unit of work run once per selected package.
///
/// Production code uses [`CommandTask`](super::CommandTask); tests can
/// provide their own implementation that doesn't spawn real processes.
/// Implementations report failure through the returned [`TaskOutcome`], never
/// by panicking.
pub trait PackageTask: Send + Sync + 'static {
    fn run(&self, package: Package) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>>;
}

/// What to do in every package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Run the package manager's install command.
    Install { cmd: String },
    /// Run a named script from the package's `scripts` table.
    RunScript { script: String },
    /// Run an arbitrary program with arguments.
    Exec { argv: Vec<String> },
}

impl TaskKind {
    /// Whether local dependencies must be linked before this task runs.
    pub fn requires_link(&self) -> bool {
        matches!(self, TaskKind::Install { .. })
    }

    /// The script this task runs, if it is a script task.
    pub fn script(&self) -> Option<&str> {
        match self {
            TaskKind::RunScript { script } => Some(script),
            _ => None,
        }
    }

    /// Whether `package` belongs in the base selection for this task.
    pub fn applies_to(&self, package: &Package) -> bool {
        match self {
            TaskKind::RunScript { script } => package.has_script(script),
            TaskKind::Install { .. } | TaskKind::Exec { .. } => true,
        }
    }

    /// Short label for logs and the dry-run listing.
    pub fn describe(&self) -> String {
        match self {
            TaskKind::Install { cmd } => format!("install ({cmd})"),
            TaskKind::RunScript { script } => format!("run {script}"),
            TaskKind::Exec { argv } => format!("exec {}", argv.join(" ")),
        }
    }
}
