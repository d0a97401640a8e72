// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreerunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Each inner list is one group of packages that depend on each other.
    #[error("Dependency cycle between selected packages: {}", render_cycles(.0))]
    DependencyCycle(Vec<Vec<String>>),

    #[error("Invalid package pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Parallelism must be >= 1 (got {0})")]
    InvalidParallelism(usize),

    #[error(
        "Run failed: {} failed ({}), {} skipped ({})",
        failed.len(),
        failed.join(", "),
        skipped.len(),
        skipped.join(", ")
    )]
    RunFailed {
        failed: Vec<String>,
        skipped: Vec<String>,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// `{a, b}; {c, d}`: one brace group per cycle.
fn render_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|members| format!("{{{}}}", members.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TreerunError>;
