// src/dag/working_set.rs

use std::collections::BTreeSet;

use crate::dag::graph::PackageGraph;
use crate::dag::package::Package;
use crate::engine::PackageName;
use crate::errors::{Result, TreerunError};

/// The packages chosen for one invocation.
///
/// Every member names a package of the graph it was built against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    members: BTreeSet<PackageName>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a working set from explicit names, rejecting unknown packages.
    pub fn from_names<I, S>(graph: &PackageGraph, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PackageName>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.into();
            if !graph.contains(&name) {
                return Err(TreerunError::PackageNotFound(name));
            }
            set.members.insert(name);
        }
        Ok(set)
    }

    /// Every package of the graph.
    pub fn all(graph: &PackageGraph) -> Self {
        Self {
            members: graph.packages().map(|p| p.name.clone()).collect(),
        }
    }

    pub(crate) fn insert(&mut self, name: PackageName) -> bool {
        self.members.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> &BTreeSet<PackageName> {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|s| s.as_str())
    }

    /// Members resolved against `graph`, in discovery order.
    pub fn ordered<'g>(&self, graph: &'g PackageGraph) -> Vec<&'g Package> {
        graph
            .packages()
            .filter(|p| self.members.contains(&p.name))
            .collect()
    }
}
