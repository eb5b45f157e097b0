//! engine::stage
//!
//! Capture of working tree changes as a single commit.
//!
//! The staging commit is the mechanism by which uncommitted content enters
//! the reconciler: no stashing, no patch files. It lands on the branch HEAD
//! is currently on, and the reconciler later replays it wherever the
//! published branch is being built.

use crate::core::types::Oid;
use crate::git::{Git, GitError};

/// Result of staging the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingResult {
    /// The working tree had no effective changes; nothing was committed.
    Clean,
    /// Tracked modifications, staged changes, and untracked files were
    /// captured in a commit on the current branch.
    Committed(Oid),
}

impl StagingResult {
    /// Check whether anything was captured.
    pub fn had_changes(&self) -> bool {
        matches!(self, StagingResult::Committed(_))
    }

    /// The staging commit, if one was created.
    pub fn commit(&self) -> Option<&Oid> {
        match self {
            StagingResult::Committed(oid) => Some(oid),
            StagingResult::Clean => None,
        }
    }
}

/// Commit every change in the working tree, untracked files included.
///
/// HEAD must be on a branch. When the tree is clean (untracked files
/// considered), the repository is left untouched and
/// [`StagingResult::Clean`] is returned. Otherwise HEAD advances by exactly
/// one commit carrying the given message, signed off if requested.
///
/// Errors from staging or committing propagate as fatal: a partial add
/// leaves the index in an indeterminate state and the caller must abort.
pub fn stage_all_changes(
    git: &Git,
    message: &str,
    signoff: bool,
) -> Result<StagingResult, GitError> {
    if !git.is_dirty(true)? {
        return Ok(StagingResult::Clean);
    }

    git.stage_all()?;
    let oid = git.commit(message, signoff)?;
    Ok(StagingResult::Committed(oid))
}
