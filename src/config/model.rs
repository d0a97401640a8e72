use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dag::Package;

/// Workspace manifest as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// parallelism = 4
/// install_cmd = "npm install"
///
/// [package.core]
/// path = "packages/core"
/// dependencies = ["utils", "left-pad"]
/// scripts = { build = "make", test = "make test" }
/// ```
///
/// All sections are optional at the TOML level; validation insists on at
/// least one package.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkspaceFile {
    /// Global run behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All packages from `[package.<name>]`, keyed by package name.
    #[serde(default)]
    pub package: BTreeMap<String, PackageConfig>,
}

/// Validated workspace manifest.
///
/// Only constructed through `TryFrom<RawWorkspaceFile>` (see `validate.rs`),
/// so every instance satisfies the manifest invariants.
#[derive(Debug, Clone)]
pub struct WorkspaceFile {
    pub config: ConfigSection,
    pub package: BTreeMap<String, PackageConfig>,
    /// Directory package paths are resolved against.
    root: PathBuf,
}

impl WorkspaceFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        package: BTreeMap<String, PackageConfig>,
    ) -> Self {
        Self {
            config,
            package,
            root: PathBuf::new(),
        }
    }

    /// Resolve package paths relative to `root` (usually the manifest's directory).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Packages in discovery order (manifest key order).
    pub fn packages(&self) -> Vec<Package> {
        self.package
            .iter()
            .map(|(name, pc)| Package {
                name: name.clone(),
                path: self.root.join(pc.effective_path(name)),
                dependencies: pc.dependencies.iter().cloned().collect(),
                scripts: pc.scripts.clone(),
            })
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of package tasks running at once.
    ///
    /// `None` means "use the machine's available parallelism".
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Keep running unrelated packages after a failure.
    #[serde(default)]
    pub force: bool,

    /// Command executed in every package directory by `treerun install`.
    #[serde(default = "default_install_cmd")]
    pub install_cmd: String,

    /// Whether `install` links local dependencies before running.
    #[serde(default = "default_link")]
    pub link: bool,
}

fn default_install_cmd() -> String {
    "npm install".to_string()
}

fn default_link() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            parallelism: None,
            force: false,
            install_cmd: default_install_cmd(),
            link: default_link(),
        }
    }
}

impl ConfigSection {
    /// Configured parallelism, falling back to the number of available CPUs.
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or_else(default_parallelism)
    }
}

pub(crate) fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// `[package.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageConfig {
    /// Package directory relative to the manifest; defaults to the package name.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Declared dependencies. Names that are not packages of this workspace
    /// are external and play no part in scheduling.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Script name -> shell command.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageConfig {
    pub fn effective_path(&self, name: &str) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from(name))
    }
}
