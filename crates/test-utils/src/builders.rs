#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use treerun::config::{ConfigSection, PackageConfig, RawWorkspaceFile, WorkspaceFile};
use treerun::dag::{Package, PackageGraph};

/// Builder for `WorkspaceFile` to simplify test setup.
pub struct WorkspaceBuilder {
    config: RawWorkspaceFile,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self {
            config: RawWorkspaceFile {
                config: ConfigSection::default(),
                package: BTreeMap::new(),
            },
        }
    }

    pub fn with_package(mut self, name: &str, package: PackageConfig) -> Self {
        self.config.package.insert(name.to_string(), package);
        self
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.config.config.parallelism = Some(n);
        self
    }

    pub fn force(mut self, val: bool) -> Self {
        self.config.config.force = val;
        self
    }

    pub fn install_cmd(mut self, cmd: &str) -> Self {
        self.config.config.install_cmd = cmd.to_string();
        self
    }

    pub fn link(mut self, val: bool) -> Self {
        self.config.config.link = val;
        self
    }

    pub fn raw(self) -> RawWorkspaceFile {
        self.config
    }

    pub fn build(self) -> WorkspaceFile {
        WorkspaceFile::try_from(self.config).expect("Failed to build valid workspace from builder")
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PackageConfig`.
pub struct PackageConfigBuilder {
    package: PackageConfig,
}

impl PackageConfigBuilder {
    pub fn new() -> Self {
        Self {
            package: PackageConfig {
                path: None,
                dependencies: vec![],
                scripts: BTreeMap::new(),
            },
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.package.path = Some(PathBuf::from(path));
        self
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.package.dependencies.push(dep.to_string());
        self
    }

    pub fn script(mut self, name: &str, cmd: &str) -> Self {
        self.package.scripts.insert(name.to_string(), cmd.to_string());
        self
    }

    pub fn build(self) -> PackageConfig {
        self.package
    }
}

impl Default for PackageConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `PackageGraph` straight from packages, in discovery order.
pub struct GraphBuilder {
    packages: Vec<Package>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { packages: vec![] }
    }

    /// Add a package at `packages/<name>` depending on `deps`.
    pub fn package(mut self, name: &str, deps: &[&str]) -> Self {
        let mut package = Package::new(name, format!("packages/{name}"));
        package.dependencies = deps.iter().map(|d| d.to_string()).collect();
        self.packages.push(package);
        self
    }

    /// Add a package that also defines the given scripts.
    pub fn package_with_scripts(mut self, name: &str, deps: &[&str], scripts: &[&str]) -> Self {
        self = self.package(name, deps);
        if let Some(package) = self.packages.last_mut() {
            for script in scripts {
                package
                    .scripts
                    .insert(script.to_string(), format!("echo {script} {name}"));
            }
        }
        self
    }

    pub fn build(self) -> PackageGraph {
        PackageGraph::new(self.packages)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `{A}`, `{B -> A}`, `{C -> A}`: one root with two dependents.
pub fn fan_out_graph() -> PackageGraph {
    GraphBuilder::new()
        .package("A", &[])
        .package("B", &["A"])
        .package("C", &["A"])
        .build()
}
