// src/dag/package.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::engine::PackageName;

/// A package of the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: PackageName,
    /// Package directory. Opaque to the scheduler; handed to the task as-is.
    pub path: PathBuf,
    /// Declared dependencies, local and external alike.
    ///
    /// [`PackageGraph`](crate::dag::PackageGraph) keeps only the names that
    /// resolve to packages of the same tree.
    pub dependencies: BTreeSet<PackageName>,
    /// Script name -> command.
    pub scripts: BTreeMap<String, String>,
}

impl Package {
    pub fn new(name: impl Into<PackageName>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: BTreeSet::new(),
            scripts: BTreeMap::new(),
        }
    }

    pub fn has_script(&self, script: &str) -> bool {
        self.scripts.contains_key(script)
    }

    pub fn script(&self, script: &str) -> Option<&str> {
        self.scripts.get(script).map(|s| s.as_str())
    }
}
