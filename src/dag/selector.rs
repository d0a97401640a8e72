// src/dag/selector.rs

//! Package selection: include/exclude patterns plus transitive expansion.

use regex::Regex;
use tracing::debug;

use crate::dag::graph::PackageGraph;
use crate::dag::package::Package;
use crate::dag::working_set::WorkingSet;
use crate::errors::{Result, TreerunError};
use crate::types::Direction;

/// User-facing selection inputs, as they come from the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Package name patterns; empty means "every package".
    pub include: Vec<String>,
    /// Package name patterns removed from the base selection.
    pub exclude: Vec<String>,
    /// Also select everything that transitively depends on the base selection.
    pub with_dependents: bool,
    /// Also select everything the base selection transitively depends on.
    pub with_dependencies: bool,
}

/// Compiled [`SelectionOptions`].
///
/// Patterns are regular expressions matched against the whole package name.
#[derive(Debug, Clone)]
pub struct Selector {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    with_dependents: bool,
    with_dependencies: bool,
}

impl Selector {
    pub fn new(options: &SelectionOptions) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(&options.include)?,
            exclude: compile_patterns(&options.exclude)?,
            with_dependents: options.with_dependents,
            with_dependencies: options.with_dependencies,
        })
    }

    /// Whether `name` passes the include/exclude patterns.
    pub fn matches_name(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(name));
        included && !self.exclude.iter().any(|re| re.is_match(name))
    }

    pub fn select(&self, graph: &PackageGraph) -> WorkingSet {
        self.select_where(graph, |_| true)
    }

    /// Compute the working set.
    ///
    /// `predicate` and the exclude patterns only gate the base selection.
    /// Packages pulled in by expansion are always added, since a package's
    /// dependencies must be present for it to run and a changed dependency
    /// must not silently miss its dependents.
    pub fn select_where<P>(&self, graph: &PackageGraph, predicate: P) -> WorkingSet
    where
        P: Fn(&Package) -> bool,
    {
        let base: Vec<&str> = graph
            .packages()
            .filter(|p| self.matches_name(&p.name) && predicate(p))
            .map(|p| p.name.as_str())
            .collect();

        let mut set = WorkingSet::new();
        for name in &base {
            set.insert(name.to_string());
        }

        if self.with_dependents {
            for name in graph.transitive_closure(base.iter().copied(), Direction::Dependents) {
                if set.insert(name.clone()) {
                    debug!(package = %name, "selected as a dependent");
                }
            }
        }

        if self.with_dependencies {
            for name in graph.transitive_closure(base.iter().copied(), Direction::Dependencies) {
                if set.insert(name.clone()) {
                    debug!(package = %name, "selected as a dependency");
                }
            }
        }

        debug!(
            base = base.len(),
            selected = set.len(),
            "package selection computed"
        );

        set
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                TreerunError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })
        })
        .collect()
}
