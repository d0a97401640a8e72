// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `treerun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "treerun",
    version,
    about = "Run a task in every package of a source tree, in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workspace manifest (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path(), global = true)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TREERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Only select packages whose name matches this regex (repeatable).
    #[arg(long = "include", value_name = "PATTERN", global = true)]
    pub include: Vec<String>,

    /// Drop packages whose name matches this regex from the selection (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN", global = true)]
    pub exclude: Vec<String>,

    /// Also run every package that transitively depends on a selected one.
    #[arg(long, global = true)]
    pub with_dependents: bool,

    /// Also run every package a selected one transitively depends on.
    #[arg(long, global = true)]
    pub with_dependencies: bool,

    /// Maximum number of packages running at once.
    ///
    /// Overrides `[config].parallelism`; defaults to the number of CPUs.
    #[arg(long, short = 'j', value_name = "N", global = true)]
    pub concurrency: Option<usize>,

    /// Keep running unrelated packages after a failure.
    ///
    /// Overrides `[config].force`.
    #[arg(long, global = true, overrides_with = "no_force")]
    pub force: bool,

    /// Stop starting packages after the first failure, even if
    /// `[config].force` is set.
    #[arg(long, global = true, overrides_with = "force")]
    pub no_force: bool,

    /// Skip linking local dependencies, even for `install`.
    #[arg(long, global = true)]
    pub no_link: bool,

    /// Parse + select, print the run order, but don't execute anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: TaskCommand,
}

impl CliArgs {
    /// `--force` / `--no-force`, whichever came last; `None` if neither.
    pub fn force_override(&self) -> Option<bool> {
        match (self.force, self.no_force) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// What to run in each package.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum TaskCommand {
    /// Install dependencies in every package (`[config].install_cmd`).
    Install,
    /// Run a script in every package that defines it.
    Run {
        /// Script name from the packages' `scripts` table.
        script: String,
    },
    /// Run a program in every package directory.
    Exec {
        /// Program and arguments, after `--`.
        #[arg(last = true, required = true, value_name = "CMD")]
        argv: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
