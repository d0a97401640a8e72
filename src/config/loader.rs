// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawWorkspaceFile, WorkspaceFile};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawWorkspaceFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkspaceFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWorkspaceFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a manifest from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks manifest invariants (packages present, no self-dependency,
///   sane `[config]` values).
/// - Resolves package paths against the manifest's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkspaceFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let workspace = WorkspaceFile::try_from(raw)?.with_root(manifest_root_dir(path));

    debug!(
        manifest = %path.display(),
        packages = workspace.package.len(),
        "workspace manifest loaded"
    );

    Ok(workspace)
}

/// Default manifest location: `Treerun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Treerun.toml")
}

/// Directory package paths are relative to.
///
/// A bare filename like `Treerun.toml` has an empty parent; that resolves to
/// the current working directory.
fn manifest_root_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
