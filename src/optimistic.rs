//! Optimistic application with rollback.
//!
//! The client applies a command locally for instant feedback, then asks the
//! authoritative side to accept it. Because the engine is deterministic, both
//! sides reach the same snapshot on success; on rejection the local state is
//! put back exactly as it was.

use crate::command::Command;
use crate::error::ErdError;
use crate::handler::Engine;
use crate::model::Database;

/// Apply to `state`, call `remote`, and undo with `rollback` if the remote fails.
///
/// `apply` returns a token (typically the prior value) that `rollback` consumes.
pub fn run_optimistic<S, T, R, E>(
    state: &mut S,
    apply: impl FnOnce(&mut S) -> T,
    remote: impl FnOnce(&S) -> Result<R, E>,
    rollback: impl FnOnce(&mut S, T),
) -> Result<R, E> {
    let token = apply(state);
    match remote(state) {
        Ok(value) => Ok(value),
        Err(err) => {
            rollback(state, token);
            Err(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError<E> {
    #[error("rejected locally: {0}")]
    Local(#[from] ErdError),
    #[error("rejected by remote: {0}")]
    Rejected(#[source] E),
}

/// A client-side copy of the snapshot kept in step with a remote authority.
#[derive(Debug, Clone)]
pub struct LocalReplica {
    snapshot: Database,
}

impl LocalReplica {
    pub fn new(snapshot: Database) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Database {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Database {
        self.snapshot
    }

    /// Apply `command` locally, then submit it through `remote`.
    ///
    /// A local rejection leaves the replica untouched and never reaches the remote.
    pub fn apply_optimistic<R, E>(
        &mut self,
        engine: &Engine,
        command: &Command,
        remote: impl FnOnce(&Command, &Database) -> Result<R, E>,
    ) -> Result<R, SyncError<E>> {
        let next = engine.apply(&self.snapshot, command)?;
        run_optimistic(
            &mut self.snapshot,
            |snapshot| std::mem::replace(snapshot, next),
            |snapshot| remote(command, snapshot),
            |snapshot, previous| {
                tracing::warn!(kind = command.kind(), "remote rejected command, rolling back");
                *snapshot = previous;
            },
        )
        .map_err(SyncError::Rejected)
    }
}
