// src/link.rs

//! Boundary to the local-dependency linker.
//!
//! Linking makes every local dependency resolve to its sibling directory in
//! the tree for the duration of a run. The symlinking itself lives outside
//! this crate; the pipeline only guarantees the order link -> schedule ->
//! unlink.

use tracing::debug;

use crate::dag::PackageGraph;
use crate::errors::Result;

pub trait Linker: Send + Sync {
    /// Wire local dependencies together. Called once, before any task starts.
    fn link(&self, graph: &PackageGraph) -> Result<()>;

    /// Undo [`link`](Self::link). Called once after the run, whatever its outcome.
    fn unlink(&self, graph: &PackageGraph) -> Result<()>;
}

/// Linker that only logs; used when no external linker is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinker;

impl Linker for NoopLinker {
    fn link(&self, graph: &PackageGraph) -> Result<()> {
        debug!(packages = graph.len(), "link: nothing to do");
        Ok(())
    }

    fn unlink(&self, graph: &PackageGraph) -> Result<()> {
        debug!(packages = graph.len(), "unlink: nothing to do");
        Ok(())
    }
}
