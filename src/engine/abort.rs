// src/engine/abort.rs

//! Shared "stop starting new work" signal.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::PackageName;

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The user interrupted the process (e.g. Ctrl-C).
    UserInitiated,
    /// A package task failed and the run is not in force mode.
    TaskFailed { package: PackageName },
}

impl AbortReason {
    pub fn is_user_initiated(&self) -> bool {
        matches!(self, AbortReason::UserInitiated)
    }
}

/// Cloneable cancellation token shared by the scheduler and the interrupt
/// handler.
///
/// The first [`abort`](Self::abort) wins; later calls are no-ops. The token
/// is never reset, so create a fresh one per run.
#[derive(Debug, Clone)]
pub struct AbortController {
    tx: Arc<watch::Sender<Option<AbortReason>>>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request an abort. Returns `true` if this call set the reason.
    pub fn abort(&self, reason: AbortReason) -> bool {
        let applied = self.tx.send_if_modified(|current| match current {
            Some(_) => false,
            None => {
                *current = Some(reason.clone());
                true
            }
        });

        if applied {
            warn!(?reason, "abort requested; no new packages will be started");
        } else {
            debug!(?reason, "abort already requested; ignoring");
        }
        applied
    }

    pub fn is_aborted(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The reason given by the first `abort` call, if any.
    pub fn reason(&self) -> Option<AbortReason> {
        self.tx.borrow().clone()
    }

    /// Resolves once the controller is aborted (immediately if it already is).
    pub async fn aborted(&self) -> AbortReason {
        let mut rx = self.tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as `self`.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Route Ctrl-C into `abort(UserInitiated)`.
///
/// The returned handle can be aborted once the run is over.
pub fn spawn_interrupt_handler(abort: AbortController) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("interrupt received; letting running packages finish");
        abort.abort(AbortReason::UserInitiated);
    })
}
