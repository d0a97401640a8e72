use std::fmt;

/// Which edges to follow when walking the package graph.
///
/// - `Dependencies`: from a package to the packages it depends on.
/// - `Dependents`: from a package to the packages that depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Dependencies,
    Dependents,
}

/// Status of a single package within one scheduler invocation.
///
/// Transitions are monotonic:
/// `Pending -> Running -> {Succeeded, Failed}` or `Pending -> Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    /// Selected for this run, not started yet.
    Pending,
    /// The task for this package is in flight.
    Running,
    Succeeded,
    Failed,
    /// Never attempted: the run was aborted or a dependency did not succeed.
    Skipped,
}

impl PackageStatus {
    /// Whether this status can no longer change during the run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PackageStatus::Succeeded | PackageStatus::Failed | PackageStatus::Skipped
        )
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageStatus::Pending => "pending",
            PackageStatus::Running => "running",
            PackageStatus::Succeeded => "succeeded",
            PackageStatus::Failed => "failed",
            PackageStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}
