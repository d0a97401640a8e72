// src/engine/report.rs

use crate::engine::{AbortReason, PackageName};
use crate::errors::{Result, TreerunError};
use crate::types::PackageStatus;

/// Final status of every package of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    statuses: Vec<(PackageName, PackageStatus)>,
    abort_reason: Option<AbortReason>,
}

impl RunReport {
    pub fn new(statuses: Vec<(PackageName, PackageStatus)>, abort_reason: Option<AbortReason>) -> Self {
        Self {
            statuses,
            abort_reason,
        }
    }

    /// `(name, status)` in discovery order.
    pub fn statuses(&self) -> &[(PackageName, PackageStatus)] {
        &self.statuses
    }

    pub fn status_of(&self, package: &str) -> Option<PackageStatus> {
        self.statuses
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, status)| *status)
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    pub fn succeeded(&self) -> Vec<PackageName> {
        self.with_status(PackageStatus::Succeeded)
    }

    pub fn failed(&self) -> Vec<PackageName> {
        self.with_status(PackageStatus::Failed)
    }

    pub fn skipped(&self) -> Vec<PackageName> {
        self.with_status(PackageStatus::Skipped)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// True when every package succeeded. An empty run is successful.
    pub fn is_success(&self) -> bool {
        self.statuses
            .iter()
            .all(|(_, status)| *status == PackageStatus::Succeeded)
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// `Ok(())` if the run succeeded, otherwise a [`TreerunError::RunFailed`]
    /// naming the failed and skipped packages.
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(TreerunError::RunFailed {
            failed: self.failed(),
            skipped: self.skipped(),
        })
    }

    /// Human-readable summary for stdout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let sections = [
            ("succeeded", self.succeeded()),
            ("failed", self.failed()),
            ("skipped", self.skipped()),
        ];
        for (label, names) in sections {
            if names.is_empty() {
                continue;
            }
            out.push_str(&format!("{label} ({}):\n", names.len()));
            for name in names {
                out.push_str(&format!("  - {name}\n"));
            }
        }
        match &self.abort_reason {
            Some(AbortReason::UserInitiated) => out.push_str("aborted: interrupted by user\n"),
            Some(AbortReason::TaskFailed { package }) => {
                out.push_str(&format!("aborted: package '{package}' failed\n"))
            }
            None => {}
        }
        if self.statuses.is_empty() {
            out.push_str("no packages selected\n");
        }
        out
    }

    fn with_status(&self, wanted: PackageStatus) -> Vec<PackageName> {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == wanted)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
