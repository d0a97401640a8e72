// src/config/validate.rs

use crate::config::model::{RawWorkspaceFile, WorkspaceFile};
use crate::errors::{Result, TreerunError};

impl TryFrom<RawWorkspaceFile> for WorkspaceFile {
    type Error = crate::errors::TreerunError;

    fn try_from(raw: RawWorkspaceFile) -> std::result::Result<Self, Self::Error> {
        validate_workspace(&raw)?;
        Ok(WorkspaceFile::new_unchecked(raw.config, raw.package))
    }
}

/// Check manifest invariants.
///
/// Dependency cycles are not rejected here. They only matter when every
/// package of the cycle is selected for the same run, and the scheduler
/// reports that case.
pub fn validate_workspace(cfg: &RawWorkspaceFile) -> Result<()> {
    ensure_has_packages(cfg)?;
    validate_global_config(cfg)?;
    validate_package_dependencies(cfg)?;
    Ok(())
}

fn ensure_has_packages(cfg: &RawWorkspaceFile) -> Result<()> {
    if cfg.package.is_empty() {
        return Err(TreerunError::ConfigError(
            "manifest must contain at least one [package.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawWorkspaceFile) -> Result<()> {
    if cfg.config.parallelism == Some(0) {
        return Err(TreerunError::ConfigError(
            "[config].parallelism must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.install_cmd.trim().is_empty() {
        return Err(TreerunError::ConfigError(
            "[config].install_cmd must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_package_dependencies(cfg: &RawWorkspaceFile) -> Result<()> {
    for (name, package) in cfg.package.iter() {
        if package.dependencies.iter().any(|dep| dep == name) {
            return Err(TreerunError::ConfigError(format!(
                "package '{}' cannot depend on itself in `dependencies`",
                name
            )));
        }
    }
    Ok(())
}
