//! engine
//!
//! The branch reconciliation pipeline.
//!
//! # Architecture
//!
//! Reconciling runs as a fixed sequence of phases, each driving the Git
//! doorway and nothing else:
//!
//! 1. **Stage** - capture uncommitted working tree content as a commit
//!    ([`stage_all_changes`])
//! 2. **Resolve base** - refresh the remote base and position HEAD on it
//! 3. **Build** - assemble the candidate branch tip on a scratch branch by
//!    replaying the working base's unique commits
//! 4. **Decide** - compare against the remote branch and create, update,
//!    or leave it alone ([`Reconciler`])
//! 5. **Clean up** - delete the scratch branch and restore HEAD, on every
//!    exit path
//!
//! Whether the remote side of a branch exists is probed with [`try_fetch`],
//! which absorbs failure instead of raising it.
//!
//! # Invariants
//!
//! - Every phase completes before the next begins; there is no parallelism
//! - The engine reads from the remote but never writes to it
//! - The engine surfaces typed results and never logs

mod fetch;
mod reconcile;
mod stage;

pub use fetch::try_fetch;
pub use reconcile::{
    create_or_update_branch, BranchAction, ReconcileError, ReconcileOutcome, ReconcileRequest,
    Reconciler,
};
pub use stage::{stage_all_changes, StagingResult};
