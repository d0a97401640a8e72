// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::config::WorkspaceFile;
use crate::dag::package::Package;
use crate::engine::PackageName;
use crate::types::Direction;

/// Internal node structure: the package plus its immediate local edges.
#[derive(Debug, Clone)]
struct PackageNode {
    package: Package,
    /// Direct local dependencies: packages that must succeed before this one.
    deps: Vec<PackageName>,
    /// Direct local dependents: packages that depend on this one.
    dependents: Vec<PackageName>,
}

/// Read-only view of all packages of a tree and their local dependency edges.
///
/// Nodes are kept in discovery order, which is also the tie-break order the
/// scheduler uses among packages that are ready at the same time. Reverse
/// edges are computed once at construction.
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    nodes: Vec<PackageNode>,
    index: HashMap<PackageName, usize>,
}

impl PackageGraph {
    /// Build a graph from packages given in discovery order.
    ///
    /// Declared dependencies that do not name a package of this graph are
    /// external and dropped. A package listed twice keeps its last definition.
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut nodes: Vec<PackageNode> = Vec::new();
        let mut index: HashMap<PackageName, usize> = HashMap::new();

        // First pass: create nodes in discovery order.
        for package in packages {
            let node = PackageNode {
                package,
                deps: Vec::new(),
                dependents: Vec::new(),
            };
            match index.get(&node.package.name) {
                Some(&i) => {
                    warn!(package = %node.package.name, "package defined twice; keeping the last definition");
                    nodes[i] = node;
                }
                None => {
                    index.insert(node.package.name.clone(), nodes.len());
                    nodes.push(node);
                }
            }
        }

        // Second pass: keep local edges only, and populate dependents.
        for i in 0..nodes.len() {
            let name = nodes[i].package.name.clone();
            let declared: Vec<PackageName> =
                nodes[i].package.dependencies.iter().cloned().collect();

            for dep in declared {
                if dep == name {
                    warn!(package = %name, "package depends on itself; ignoring edge");
                    continue;
                }
                match index.get(&dep) {
                    Some(&j) => {
                        nodes[i].deps.push(dep);
                        nodes[j].dependents.push(name.clone());
                    }
                    None => {
                        debug!(package = %name, dependency = %dep, "external dependency; not scheduled");
                    }
                }
            }
        }

        Self { nodes, index }
    }

    /// Build the graph for a validated workspace manifest.
    pub fn from_workspace(workspace: &WorkspaceFile) -> Self {
        Self::new(workspace.packages())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.index.get(name).map(|&i| &self.nodes[i].package)
    }

    /// Position of the package in discovery order.
    pub fn discovery_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All packages, in discovery order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.nodes.iter().map(|n| &n.package)
    }

    /// Immediate local dependencies of a package.
    pub fn dependencies_of(&self, name: &str) -> &[PackageName] {
        self.index
            .get(name)
            .map(|&i| self.nodes[i].deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate local dependents of a package.
    pub fn dependents_of(&self, name: &str) -> &[PackageName] {
        self.index
            .get(name)
            .map(|&i| self.nodes[i].dependents.as_slice())
            .unwrap_or(&[])
    }

    pub fn neighbours(&self, name: &str, direction: Direction) -> &[PackageName] {
        match direction {
            Direction::Dependencies => self.dependencies_of(name),
            Direction::Dependents => self.dependents_of(name),
        }
    }

    /// Every package reachable from `seeds` by repeatedly following edges in
    /// `direction`.
    ///
    /// A seed is part of the result only if it is reachable from some seed
    /// (which requires a cycle). Unknown seeds contribute nothing.
    pub fn transitive_closure<'s, I>(&self, seeds: I, direction: Direction) -> BTreeSet<PackageName>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut stack: Vec<&str> = Vec::new();
        for seed in seeds {
            stack.extend(self.neighbours(seed, direction).iter().map(|s| s.as_str()));
        }

        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            stack.extend(self.neighbours(name, direction).iter().map(|s| s.as_str()));
        }

        visited.into_iter().map(str::to_string).collect()
    }

    /// `members` in the order a run with unlimited parallelism would start
    /// them: dependencies first, ties broken by discovery order.
    ///
    /// Members caught in a cycle can never start; they are appended last, in
    /// discovery order. Unknown names are ignored.
    pub fn scheduling_order(&self, members: &BTreeSet<PackageName>) -> Vec<&Package> {
        let mut waiting: BTreeMap<usize, usize> = BTreeMap::new();
        for name in members {
            if let Some(&i) = self.index.get(name) {
                let in_set = self.nodes[i]
                    .deps
                    .iter()
                    .filter(|d| members.contains(*d))
                    .count();
                waiting.insert(i, in_set);
            }
        }

        let mut ready: BTreeSet<usize> = waiting
            .iter()
            .filter(|(_, deps)| **deps == 0)
            .map(|(&i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(waiting.len());

        while let Some(i) = ready.pop_first() {
            waiting.remove(&i);
            order.push(&self.nodes[i].package);
            for dependent in &self.nodes[i].dependents {
                let Some(&j) = self.index.get(dependent) else {
                    continue;
                };
                if let Some(deps) = waiting.get_mut(&j) {
                    *deps -= 1;
                    if *deps == 0 {
                        ready.insert(j);
                    }
                }
            }
        }

        order.extend(waiting.keys().map(|&i| &self.nodes[i].package));
        order
    }

    /// Dependency cycles among `members`, considering only edges between
    /// members.
    ///
    /// Each cycle lists its packages in discovery order; cycles are ordered by
    /// their first package.
    pub fn cycles_within(&self, members: &BTreeSet<PackageName>) -> Vec<Vec<PackageName>> {
        // Edge direction: dep -> package.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in members.iter().filter(|m| self.contains(m)) {
            graph.add_node(name.as_str());
            for dep in self.dependencies_of(name) {
                if members.contains(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        let mut cycles: Vec<Vec<PackageName>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<PackageName> =
                    component.into_iter().map(str::to_string).collect();
                names.sort_by_key(|n| self.discovery_index(n));
                names
            })
            .collect();

        cycles.sort_by_key(|cycle| cycle.first().and_then(|n| self.discovery_index(n)));
        cycles
    }
}
