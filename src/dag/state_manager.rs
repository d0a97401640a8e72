// src/dag/state_manager.rs

//! Per-run package state for the scheduler.

use std::collections::HashMap;

use tracing::debug;

use crate::dag::graph::PackageGraph;
use crate::dag::package::Package;
use crate::dag::working_set::WorkingSet;
use crate::engine::PackageName;
use crate::errors::{Result, TreerunError};
use crate::types::PackageStatus;

/// One working-set member with its edges restricted to the working set.
#[derive(Debug, Clone)]
struct PackageEntry {
    package: Package,
    /// Dependencies that are also in the working set.
    deps: Vec<PackageName>,
    /// Dependents that are also in the working set.
    dependents: Vec<PackageName>,
    status: PackageStatus,
}

/// Status of every working-set member for one scheduler invocation.
///
/// Created fresh per invocation. Edges leaving the working set are dropped
/// at construction: dependencies outside the set count as satisfied.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Member names in discovery order.
    order: Vec<PackageName>,
    entries: HashMap<PackageName, PackageEntry>,
}

impl RunState {
    pub fn new(graph: &PackageGraph, working_set: &WorkingSet) -> Result<Self> {
        if let Some(unknown) = working_set.iter().find(|name| !graph.contains(name)) {
            return Err(TreerunError::PackageNotFound(unknown.to_string()));
        }

        let mut order = Vec::with_capacity(working_set.len());
        let mut entries = HashMap::with_capacity(working_set.len());

        for package in working_set.ordered(graph) {
            let in_set = |names: &[PackageName]| -> Vec<PackageName> {
                names
                    .iter()
                    .filter(|n| working_set.contains(n))
                    .cloned()
                    .collect()
            };

            order.push(package.name.clone());
            entries.insert(
                package.name.clone(),
                PackageEntry {
                    package: package.clone(),
                    deps: in_set(graph.dependencies_of(&package.name)),
                    dependents: in_set(graph.dependents_of(&package.name)),
                    status: PackageStatus::Pending,
                },
            );
        }

        Ok(Self { order, entries })
    }

    pub fn status_of(&self, name: &str) -> Option<PackageStatus> {
        self.entries.get(name).map(|e| e.status)
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.entries.get(name).map(|e| &e.package)
    }

    pub fn set_status(&mut self, name: &str, status: PackageStatus) {
        if let Some(entry) = self.entries.get_mut(name) {
            debug!(package = %name, from = %entry.status, to = %status, "package status change");
            entry.status = status;
        }
    }

    /// Whether every in-set dependency of `name` has succeeded.
    ///
    /// Returns `None` for packages outside the run.
    pub fn deps_satisfied(&self, name: &str) -> Option<bool> {
        let entry = self.entries.get(name)?;
        Some(
            entry
                .deps
                .iter()
                .all(|dep| self.status_of(dep) == Some(PackageStatus::Succeeded)),
        )
    }

    /// Mark every pending package that transitively depends on `failed` as
    /// `Skipped`.
    ///
    /// Returns the newly skipped packages (not including `failed` itself).
    pub fn mark_dependents_skipped(&mut self, failed: &str) -> Vec<PackageName> {
        let mut stack: Vec<PackageName> = self
            .entries
            .get(failed)
            .map(|e| e.dependents.clone())
            .unwrap_or_default();

        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(entry) = self.entries.get_mut(&name) {
                if entry.status == PackageStatus::Pending {
                    entry.status = PackageStatus::Skipped;
                    debug!(
                        package = %name,
                        upstream = %failed,
                        "skipping package because a dependency did not succeed"
                    );
                    newly_skipped.push(name.clone());
                    stack.extend(entry.dependents.iter().cloned());
                }
            }
        }

        self.sort_by_discovery(&mut newly_skipped);
        newly_skipped
    }

    /// Mark every pending package as `Skipped`.
    pub fn skip_all_pending(&mut self) -> Vec<PackageName> {
        let pending = self.names_with(PackageStatus::Pending);
        for name in &pending {
            self.set_status(name, PackageStatus::Skipped);
        }
        pending
    }

    /// Up to `limit` pending packages whose dependencies have all succeeded,
    /// in discovery order. Does not change any status.
    pub fn ready(&self, limit: usize) -> Vec<PackageName> {
        self.order
            .iter()
            .filter(|name| {
                self.status_of(name) == Some(PackageStatus::Pending)
                    && self.deps_satisfied(name).unwrap_or(false)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Members with the given status, in discovery order.
    pub fn names_with(&self, status: PackageStatus) -> Vec<PackageName> {
        self.order
            .iter()
            .filter(|name| self.status_of(name) == Some(status))
            .cloned()
            .collect()
    }

    pub fn count(&self, status: PackageStatus) -> usize {
        self.entries.values().filter(|e| e.status == status).count()
    }

    pub fn all_terminal(&self) -> bool {
        self.entries.values().all(|e| e.status.is_terminal())
    }

    /// `(name, status)` for every member, in discovery order.
    pub fn snapshot(&self) -> Vec<(PackageName, PackageStatus)> {
        self.order
            .iter()
            .filter_map(|name| self.status_of(name).map(|s| (name.clone(), s)))
            .collect()
    }

    fn sort_by_discovery(&self, names: &mut [PackageName]) {
        let position: HashMap<&str, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        names.sort_by_key(|n| position.get(n.as_str()).copied());
    }
}
