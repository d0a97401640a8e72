// src/config/mod.rs

//! Workspace manifest loading and validation.
//!
//! - [`model`] defines the TOML-backed data model.
//! - [`loader`] reads a manifest from disk.
//! - [`validate`] checks manifest invariants and produces a [`WorkspaceFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigSection, PackageConfig, RawWorkspaceFile, WorkspaceFile};
pub use validate::validate_workspace;
