//! engine::reconcile
//!
//! The branch reconciliation algorithm.
//!
//! Given the branch HEAD is on (the **working base**), the base branch the
//! eventual pull request targets, and the name of the branch to publish,
//! the reconciler decides whether that branch must be created, rewritten,
//! or left alone - and shapes its history so review sees a clean delta on
//! top of the base.
//!
//! # Algorithm
//!
//! 1. **Stage.** Uncommitted working tree content (untracked files
//!    included) is captured as a commit on the working base.
//! 2. **Resolve base.** The remote base is fetched best-effort. When the
//!    working base is not the base, HEAD switches to the base branch,
//!    creating it from `origin/<base>` if needed.
//! 3. **Build.** A scratch branch is created at `origin/<base>` and every
//!    commit unique to the working base - workflow commits first, the
//!    staging commit last - is cherry-picked onto it. Picks whose changes
//!    already exist on the base come back empty and are dropped.
//! 4. **Decide.** If the remote branch does not exist, the branch is
//!    created when the scratch tip differs from the base and skipped
//!    otherwise. If it exists, the branch is rewritten unless the scratch
//!    tip already publishes the same patch sequence.
//! 5. **Clean up.** The scratch branch is deleted and HEAD returns to the
//!    working base. This runs on every exit path, including failures.
//!
//! The staging commit is left on the working base afterwards; its content
//! is published through the reconciled branch, and a later run replays it
//! to an identical tree, so repeated runs converge on
//! [`BranchAction::None`].
//!
//! # Invariants
//!
//! - HEAD refers to the working base when the call returns, on every path
//! - The scratch branch never survives the call
//! - The engine never pushes; `Created`/`Updated` are requests for the
//!   caller to force-push

use serde::Serialize;
use thiserror::Error;

use crate::core::naming;
use crate::core::types::{BranchName, Oid, RefName};
use crate::git::{Git, GitError, DEFAULT_REMOTE};

use super::fetch::try_fetch;
use super::stage::stage_all_changes;

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// HEAD must be on a branch when the engine is invoked.
    #[error("HEAD is detached; reconciling requires a checked-out branch")]
    DetachedHead,

    /// A Git operation failed. HEAD has been restored to the working base
    /// where possible, but content captured for this run may be incomplete.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// What the reconciler did to the target branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchAction {
    /// The branch was left alone; there is nothing to publish.
    None,
    /// The branch was created locally and should be force-pushed.
    Created,
    /// The branch was rewritten locally and should be force-pushed.
    Updated,
}

impl BranchAction {
    /// Check whether the branch was left alone.
    pub fn is_none(&self) -> bool {
        matches!(self, BranchAction::None)
    }

    /// Check whether the caller has something to push.
    pub fn needs_push(&self) -> bool {
        !self.is_none()
    }

    /// Get a human-readable description of the action.
    pub fn description(&self) -> &'static str {
        match self {
            BranchAction::None => "none",
            BranchAction::Created => "created",
            BranchAction::Updated => "updated",
        }
    }
}

impl std::fmt::Display for BranchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Outcome of a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// What happened to the target branch.
    pub action: BranchAction,
    /// Whether the branch tip tree differs from the base tip tree.
    ///
    /// Meaningful only when `action` is `Created` or `Updated`; callers
    /// typically close or skip the pull request when this is `false`.
    pub has_diff_with_base: bool,
}

impl ReconcileOutcome {
    fn none() -> Self {
        Self {
            action: BranchAction::None,
            has_diff_with_base: false,
        }
    }
}

/// Inputs to a reconcile.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Commit message for the staging commit, if one is needed.
    pub message: String,
    /// Base branch the published branch targets.
    ///
    /// `None` means the branch HEAD is on acts as the base.
    pub base: Option<BranchName>,
    /// The branch to create or update.
    pub branch: BranchName,
    /// Apply a `Signed-off-by` trailer to the staging commit.
    pub signoff: bool,
}

impl ReconcileRequest {
    /// Create a request with the working base as the base and no signoff.
    pub fn new(message: impl Into<String>, branch: BranchName) -> Self {
        Self {
            message: message.into(),
            base: None,
            branch,
            signoff: false,
        }
    }
}

/// The reconciler.
///
/// Borrows the Git doorway for the duration of a reconcile. One invocation
/// owns the repository exclusively; concurrent reconciles against the same
/// checkout are not supported.
pub struct Reconciler<'a> {
    git: &'a Git,
}

impl<'a> Reconciler<'a> {
    /// Create a new reconciler.
    pub fn new(git: &'a Git) -> Self {
        Self { git }
    }

    /// Create or update the requested branch from the repository's current
    /// content.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::DetachedHead`] if HEAD is not on a branch
    /// - [`ReconcileError::Git`] for any failing Git operation; cleanup has
    ///   already run when this is returned
    pub fn create_or_update_branch(
        &self,
        req: &ReconcileRequest,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let working_base = self
            .git
            .current_branch()?
            .ok_or(ReconcileError::DetachedHead)?;

        let temp = naming::temp_branch_for(&req.branch);
        let outcome = self.run(req, &working_base, &temp);

        match outcome {
            Ok(outcome) => {
                self.cleanup(&working_base, &temp)?;
                Ok(outcome)
            }
            Err(err) => {
                // Surface the original failure; cleanup is best effort here.
                let _ = self.cleanup(&working_base, &temp);
                Err(err)
            }
        }
    }

    /// Phases 1-4; cleanup happens in the caller.
    fn run(
        &self,
        req: &ReconcileRequest,
        working_base: &BranchName,
        temp: &BranchName,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // Stage: capture uncommitted content on the working base. The
        // working base tip afterwards holds everything this run publishes.
        stage_all_changes(self.git, &req.message, req.signoff)?;
        let content_tip = self.git.head_oid()?;

        // Resolve base.
        let base = req.base.clone().unwrap_or_else(|| working_base.clone());
        try_fetch(self.git, &base);
        let base_ref = RefName::for_remote_branch(DEFAULT_REMOTE, &base);
        if base != *working_base {
            self.switch_to_base(&base, &base_ref)?;
        }
        let base_tip = self.git.resolve_ref(base_ref.as_str())?;

        // Build the candidate tip on the scratch branch.
        if self.git.branch_exists(temp) {
            // Leftover from an interrupted run.
            self.git.delete_branch(temp)?;
        }
        self.git.create_branch(temp, &base_tip, false)?;
        self.git.checkout_branch(temp)?;
        for oid in self.git.commits_in_range(&base_tip, &content_tip)? {
            self.git.cherry_pick(&oid)?;
        }
        let candidate_tip = self.git.head_oid()?;

        // Decide against the remote branch.
        let branch_exists_on_remote = try_fetch(self.git, &req.branch);
        if !branch_exists_on_remote {
            if !self.git.has_diff(&base_tip, &candidate_tip)? {
                // The branch would publish nothing.
                return Ok(ReconcileOutcome::none());
            }

            self.git.create_branch(&req.branch, &candidate_tip, true)?;
            self.git.clear_upstream(&req.branch)?;
            return Ok(ReconcileOutcome {
                action: BranchAction::Created,
                has_diff_with_base: true,
            });
        }

        let branch_ref = RefName::for_remote_branch(DEFAULT_REMOTE, &req.branch);
        let remote_tip = self.git.resolve_ref(branch_ref.as_str())?;
        if self.publishes_same_delta(&base_tip, &candidate_tip, &remote_tip)? {
            return Ok(ReconcileOutcome::none());
        }

        self.git.create_branch(&req.branch, &candidate_tip, true)?;
        let has_diff_with_base = self.git.has_diff(&base_tip, &candidate_tip)?;
        Ok(ReconcileOutcome {
            action: BranchAction::Updated,
            has_diff_with_base,
        })
    }

    /// Position HEAD on the base branch, creating it from the
    /// remote-tracking ref when no local branch exists yet.
    fn switch_to_base(&self, base: &BranchName, base_ref: &RefName) -> Result<(), GitError> {
        if !self.git.branch_exists(base) {
            let tip = self.git.resolve_ref(base_ref.as_str())?;
            self.git.create_branch(base, &tip, false)?;
            self.git
                .set_upstream(base, &format!("{}/{}", DEFAULT_REMOTE, base))?;
        }
        self.git.checkout_branch(base)
    }

    /// Check whether the candidate and the remote branch publish the same
    /// review delta on top of the base.
    ///
    /// Commit ids are useless for this: replaying identical patches mints
    /// new ids on every run. Two branches are equivalent when their tip
    /// trees match and they carry the same number of commits past the base.
    fn publishes_same_delta(
        &self,
        base_tip: &Oid,
        candidate_tip: &Oid,
        remote_tip: &Oid,
    ) -> Result<bool, GitError> {
        if self.git.has_diff(candidate_tip, remote_tip)? {
            return Ok(false);
        }

        let ours = self.git.commit_count(base_tip, candidate_tip)?;
        let theirs = self.git.commit_count(base_tip, remote_tip)?;
        Ok(ours == theirs)
    }

    /// Restore HEAD to the working base and drop the scratch branch.
    fn cleanup(&self, working_base: &BranchName, temp: &BranchName) -> Result<(), GitError> {
        self.git.checkout_branch(working_base)?;
        if self.git.branch_exists(temp) {
            self.git.delete_branch(temp)?;
        }
        Ok(())
    }
}

/// Reconcile a branch (convenience function).
///
/// This is a simpler interface when you just need one reconcile without
/// holding on to a `Reconciler`.
pub fn create_or_update_branch(
    git: &Git,
    req: &ReconcileRequest,
) -> Result<ReconcileOutcome, ReconcileError> {
    Reconciler::new(git).create_or_update_branch(req)
}
