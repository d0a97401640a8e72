use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::{Package, Scheduler};
use crate::errors::Result;
use crate::exec::PackageTask;

use super::{AbortController, Completion, RunReport, TaskOutcome};

/// Drives the [`Scheduler`] core and runs package tasks.
///
/// This is the async shell around the scheduler: every started package runs
/// in its own Tokio task, and its outcome comes back over an mpsc channel.
/// All scheduling decisions and state changes happen on this loop, one at a
/// time; task futures never touch the run state.
pub struct Runtime {
    scheduler: Scheduler,
    task: Arc<dyn PackageTask>,
    abort: AbortController,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("abort", &self.abort)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(scheduler: Scheduler, task: Arc<dyn PackageTask>, abort: AbortController) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel::<Completion>(64);
        Self {
            scheduler,
            task,
            abort,
            completion_tx,
            completion_rx,
        }
    }

    /// Main loop.
    ///
    /// - Starts the first batch of ready packages.
    /// - Waits for either a package completion or the abort signal.
    /// - Feeds the event into the scheduler and starts whatever it unblocked.
    ///
    /// Returns once every package is terminal. An abort never interrupts a
    /// running task; the loop keeps waiting for those to finish.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("treerun runtime started");

        let step = self.scheduler.start()?;
        self.spawn_started(step.newly_started);

        let mut abort_seen = false;

        while !self.scheduler.is_finished() {
            tokio::select! {
                completion = self.completion_rx.recv() => {
                    // We hold a sender ourselves, so the channel cannot close.
                    let Some(completion) = completion else { break };
                    debug!(?completion, "runtime received completion");

                    let step = self
                        .scheduler
                        .step_completion(&completion.package, completion.outcome)?;
                    self.spawn_started(step.newly_started);
                }
                reason = self.abort.aborted(), if !abort_seen => {
                    abort_seen = true;
                    info!(
                        ?reason,
                        running = self.scheduler.running(),
                        "abort observed; waiting for running packages"
                    );
                    let step = self.scheduler.step_abort()?;
                    self.spawn_started(step.newly_started);
                }
            }
        }

        info!("runtime exiting");
        Ok(self.scheduler.report())
    }

    fn spawn_started(&self, packages: Vec<Package>) {
        if packages.is_empty() {
            return;
        }

        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        debug!(?names, "spawning package tasks");

        for package in packages {
            let task = Arc::clone(&self.task);
            let tx = self.completion_tx.clone();
            let name = package.name.clone();

            tokio::spawn(async move {
                // Run the task in its own Tokio task so a panic becomes a
                // failure instead of a completion that never arrives.
                let handle = tokio::spawn(async move { task.run(package).await });
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(package = %name, error = %err, "package task panicked");
                        TaskOutcome::Failed(-1)
                    }
                };

                let _ = tx
                    .send(Completion {
                        package: name,
                        outcome,
                    })
                    .await;
            });
        }
    }
}
