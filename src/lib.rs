// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod link;
pub mod logging;
pub mod pipeline;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::engine::{spawn_interrupt_handler, AbortController, RunReport};
use crate::exec::{CommandTask, PackageTask};
use crate::link::NoopLinker;

/// High-level entry point used by `main.rs`.
///
/// This wires together the pipeline stages:
/// - manifest loading + plan validation
/// - package selection
/// - linking
/// - scheduling (with Ctrl-C routed into the abort signal)
/// - unlinking
/// - the final report
///
/// Returns the report so the caller can pick an exit code. A dry run returns
/// an empty (successful) report.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let plan = pipeline::validate(&args)?;
    let working_set = plan.select();

    if args.dry_run {
        print!("{}", plan.render_dry_run(&working_set));
        debug!("dry-run complete (no execution)");
        return Ok(RunReport::default());
    }

    let abort = AbortController::new();
    let interrupt = spawn_interrupt_handler(abort.clone());

    let task: Arc<dyn PackageTask> = Arc::new(CommandTask::new(plan.kind.clone()));
    let outcome = plan.execute(&working_set, &NoopLinker, task, abort).await;
    interrupt.abort();

    let report = outcome?;
    pipeline::report(&report);
    Ok(report)
}
