// src/pipeline.rs

//! The run as an explicit sequence of stages:
//! validate -> select -> link -> schedule -> unlink -> report.
//!
//! Each stage is a separate function so it can be exercised on its own.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cli::{CliArgs, TaskCommand};
use crate::config::{load_and_validate, WorkspaceFile};
use crate::dag::{check_cycles, PackageGraph, SchedulerOptions, SelectionOptions, Selector, WorkingSet};
use crate::engine::{run_packages, AbortController, RunReport};
use crate::errors::{Result, TreerunError};
use crate::exec::{PackageTask, TaskKind};
use crate::link::Linker;

/// Invocation settings that do not depend on the manifest.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: TaskCommand,
    pub selection: SelectionOptions,
    /// Overrides `[config].parallelism` when set.
    pub concurrency: Option<usize>,
    /// Overrides `[config].force` when set.
    pub force: Option<bool>,
    pub no_link: bool,
}

impl From<&CliArgs> for Invocation {
    fn from(args: &CliArgs) -> Self {
        Self {
            command: args.command.clone(),
            selection: SelectionOptions {
                include: args.include.clone(),
                exclude: args.exclude.clone(),
                with_dependents: args.with_dependents,
                with_dependencies: args.with_dependencies,
            },
            concurrency: args.concurrency,
            force: args.force_override(),
            no_link: args.no_link,
        }
    }
}

/// Everything a run needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub graph: PackageGraph,
    pub selector: Selector,
    pub kind: TaskKind,
    pub options: SchedulerOptions,
    /// Whether the linker runs around the schedule.
    pub link: bool,
}

/// Stage 1: load the manifest and resolve the plan.
pub fn validate(args: &CliArgs) -> Result<RunPlan> {
    let workspace = load_and_validate(&args.config)?;
    RunPlan::new(&workspace, &Invocation::from(args))
}

impl RunPlan {
    /// Merge manifest and invocation settings.
    ///
    /// CLI values win over `[config]`.
    pub fn new(workspace: &WorkspaceFile, invocation: &Invocation) -> Result<Self> {
        let parallelism = invocation
            .concurrency
            .unwrap_or_else(|| workspace.config.effective_parallelism());
        if parallelism == 0 {
            return Err(TreerunError::InvalidParallelism(parallelism));
        }

        let kind = match &invocation.command {
            TaskCommand::Install => TaskKind::Install {
                cmd: workspace.config.install_cmd.clone(),
            },
            TaskCommand::Run { script } => TaskKind::RunScript {
                script: script.clone(),
            },
            TaskCommand::Exec { argv } => {
                if argv.is_empty() {
                    return Err(TreerunError::ConfigError(
                        "exec requires a command after `--`".to_string(),
                    ));
                }
                TaskKind::Exec { argv: argv.clone() }
            }
        };

        let link = kind.requires_link() && workspace.config.link && !invocation.no_link;

        Ok(Self {
            graph: PackageGraph::from_workspace(workspace),
            selector: Selector::new(&invocation.selection)?,
            options: SchedulerOptions {
                parallelism,
                force: invocation.force.unwrap_or(workspace.config.force),
            },
            kind,
            link,
        })
    }

    /// Stage 2: compute the working set.
    pub fn select(&self) -> WorkingSet {
        let working_set = self
            .selector
            .select_where(&self.graph, |p| self.kind.applies_to(p));

        if working_set.is_empty() {
            warn!(task = %self.kind.describe(), "no packages selected; nothing to run");
        } else {
            info!(
                task = %self.kind.describe(),
                selected = working_set.len(),
                total = self.graph.len(),
                "packages selected"
            );
        }
        working_set
    }

    /// Stages 3 to 5: link, schedule, unlink.
    ///
    /// A dependency cycle in `working_set` is reported before linking.
    /// Unlinking is attempted whenever linking succeeded, even if scheduling
    /// failed; a scheduling error takes precedence over an unlink error.
    pub async fn execute(
        &self,
        working_set: &WorkingSet,
        linker: &dyn Linker,
        task: Arc<dyn PackageTask>,
        abort: AbortController,
    ) -> Result<RunReport> {
        check_cycles(&self.graph, working_set)?;

        if self.link {
            info!("linking local dependencies");
            linker.link(&self.graph)?;
        }

        let scheduled = run_packages(&self.graph, working_set, task, self.options, abort).await;

        if self.link {
            info!("unlinking local dependencies");
            if let Err(err) = linker.unlink(&self.graph) {
                error!(error = %err, "unlinking local dependencies failed");
                if scheduled.is_ok() {
                    return Err(err);
                }
            }
        }

        scheduled
    }

    /// Dry-run output: the working set in scheduling order with its in-set
    /// dependencies.
    pub fn render_dry_run(&self, working_set: &WorkingSet) -> String {
        let mut out = String::new();
        out.push_str("treerun dry-run\n");
        out.push_str(&format!("  task = {}\n", self.kind.describe()));
        out.push_str(&format!("  parallelism = {}\n", self.options.parallelism));
        out.push_str(&format!("  force = {}\n", self.options.force));
        out.push_str(&format!("  link = {}\n", self.link));
        out.push('\n');

        out.push_str(&format!("packages ({}):\n", working_set.len()));
        for package in self.graph.scheduling_order(working_set.names()) {
            out.push_str(&format!("  - {} ({})\n", package.name, package.path.display()));
            let deps: Vec<&str> = self
                .graph
                .dependencies_of(&package.name)
                .iter()
                .filter(|d| working_set.contains(d))
                .map(|d| d.as_str())
                .collect();
            if !deps.is_empty() {
                out.push_str(&format!("      after: {:?}\n", deps));
            }
        }
        out
    }
}

/// Stage 6: print the report to stdout and log a summary.
pub fn report(report: &RunReport) {
    print!("{}", report.render());

    if report.is_success() {
        info!(packages = report.len(), "all packages succeeded");
    } else {
        warn!(
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            "run did not succeed"
        );
    }
}
