//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! reweave. The engine drives it; it never drives itself. Every operation
//! returns a structured result with errors normalized into typed failure
//! categories.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a Git repository.
//! No other module should import `git2` directly. This ensures:
//!
//! - Consistent error handling across all Git operations
//! - Strong type guarantees at the boundary
//! - A single place where the commit identity is applied
//!
//! # Identity
//!
//! Commits need an author and committer. Rather than mutating global or
//! repository config, the identity is an immutable [`VcsConfig`] value
//! bound at [`Git::open`] time and used for every commit the driver
//! authors.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: Repository has no working tree
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CherryPickConflict`]: A replayed commit did not apply cleanly
//!
//! # Example
//!
//! ```ignore
//! use reweave::git::{Git, VcsConfig};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."), VcsConfig::new("CI Bot", "ci@example.com"))?;
//! let oid = git.resolve_ref("refs/heads/main")?;
//! println!("main is at {}", oid.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// The remote the engine reconciles against.
///
/// Remote-tracking refs are always read and written under
/// `refs/remotes/origin/`.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from Git operations.
///
/// These error types cover the categories of Git failures the engine
/// handles distinctly. Everything else is reported as [`GitError::Internal`]
/// with the underlying message preserved.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    ///
    /// The engine stages, commits, and cherry-picks through the working
    /// tree, so a bare repository is rejected at open time.
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A cherry-picked commit produced conflicts.
    ///
    /// The driver restores HEAD, index, and working tree before returning
    /// this, so the caller only has to deal with its own branch state.
    #[error("cherry-pick of {oid} produced conflicts")]
    CherryPickConflict {
        /// The commit that failed to apply
        oid: String,
    },

    /// Internal git error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Immutable commit identity for the driver.
///
/// Both author and committer of commits the driver creates use this
/// identity (cherry-picks keep the original author and use it as the
/// committer only). Constructing the driver with a `VcsConfig` guarantees
/// an identity is always available; there is no "identity not configured"
/// failure mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsConfig {
    user_name: String,
    user_email: String,
}

impl VcsConfig {
    /// Create a commit identity.
    pub fn new(user_name: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_email: user_email.into(),
        }
    }

    /// The configured user name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// The configured user email.
    pub fn user_email(&self) -> &str {
        &self.user_email
    }
}

/// Result of replaying a commit onto HEAD.
///
/// An empty replay is an expected outcome, not an error: when the change a
/// commit carries is already present on the new base, the pick produces a
/// tree identical to HEAD and nothing is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CherryPickOutcome {
    /// The commit applied; the id of the newly recorded commit.
    Applied(Oid),
    /// The commit's changes were already present; nothing was recorded.
    Empty,
}

impl CherryPickOutcome {
    /// Check whether the pick was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, CherryPickOutcome::Empty)
    }

    /// The recorded commit id, if one was created.
    pub fn applied(&self) -> Option<&Oid> {
        match self {
            CherryPickOutcome::Applied(oid) => Some(oid),
            CherryPickOutcome::Empty => None,
        }
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: chrono::DateTime<chrono::Utc>,
}

/// The primary Git interface.
///
/// Open one per repository and pass it to the engine by reference; the
/// engine never takes ownership and never mutates the identity.
///
/// # Example
///
/// ```ignore
/// use reweave::git::{Git, VcsConfig};
/// use std::path::Path;
///
/// let git = Git::open(Path::new("."), VcsConfig::new("CI Bot", "ci@example.com"))?;
///
/// // Read operations
/// let head = git.head_oid()?;
/// let branch = git.current_branch()?;
///
/// // Content operations
/// git.stage_all()?;
/// let staged = git.commit("Capture workflow changes", false)?;
/// ```
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    /// The repository's working directory
    work_dir: PathBuf,
    /// Identity for commits the driver authors
    config: VcsConfig,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("config", &self.config)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path, bound to a commit identity.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working tree
    pub fn open(path: &Path, config: VcsConfig) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        let work_dir = match repo.workdir() {
            Some(dir) => dir.to_path_buf(),
            None => return Err(GitError::BareRepo),
        };

        Ok(Self {
            repo,
            work_dir,
            config,
        })
    }

    /// The identity this driver commits with.
    pub fn config(&self) -> &VcsConfig {
        &self.config
    }

    /// Signature for commits the driver authors.
    fn signature(&self) -> Result<git2::Signature<'static>, GitError> {
        git2::Signature::now(&self.config.user_name, &self.config.user_email).map_err(|e| {
            GitError::Internal {
                message: format!("invalid identity: {}", e.message()),
            }
        })
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to its target OID.
    ///
    /// This peels through symbolic refs and tags to get the commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Check if a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    // =========================================================================
    // Branch Operations
    // =========================================================================

    /// Check if a local branch exists.
    pub fn branch_exists(&self, name: &BranchName) -> bool {
        self.repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    /// Create a local branch at `target`.
    ///
    /// With `force`, an existing branch of the same name is moved to
    /// `target` instead of failing. The branch being moved must not be
    /// checked out.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if `target` is not a commit
    pub fn create_branch(&self, name: &BranchName, target: &Oid, force: bool) -> Result<(), GitError> {
        let commit = self.find_commit(target)?;
        self.repo
            .branch(name.as_str(), &commit, force)
            .map_err(|e| GitError::from_git2(e, RefName::for_branch(name).as_str()))?;
        Ok(())
    }

    /// Delete a local branch.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the branch doesn't exist
    pub fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::for_branch(name);
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        branch
            .delete()
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }

    /// List all local branches.
    ///
    /// Returns validated `BranchName` instances.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            if let Some(name) = branch.name().ok().flatten() {
                // Skip invalid branch names
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }

        Ok(names)
    }

    /// Check out a local branch, forcing the working tree to match.
    ///
    /// The engine only checks out over clean or already-captured state, so
    /// a forced checkout cannot lose content it cares about.
    pub fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::for_branch(name);
        let object = self
            .repo
            .revparse_single(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(&object, Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        self.repo
            .set_head(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        Ok(())
    }

    /// Set the upstream of a local branch.
    ///
    /// `upstream` is the remote-tracking shorthand, e.g. `origin/main`.
    /// The remote-tracking ref must exist.
    pub fn set_upstream(&self, name: &BranchName, upstream: &str) -> Result<(), GitError> {
        let refname = RefName::for_branch(name);
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        branch
            .set_upstream(Some(upstream))
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }

    /// Remove any upstream configuration from a local branch.
    ///
    /// A no-op when the branch has no upstream.
    pub fn clear_upstream(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::for_branch(name);
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        match branch.set_upstream(None) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }

    // =========================================================================
    // Working Tree Operations
    // =========================================================================

    /// Check whether the working tree has any effective change.
    ///
    /// Covers tracked modifications, staged changes, and (when
    /// `include_untracked` is set) untracked files. Ignored files never
    /// count.
    pub fn is_dirty(&self, include_untracked: bool) -> Result<bool, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .recurse_untracked_dirs(include_untracked)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::Internal {
                message: format!("failed to probe worktree status: {}", e.message()),
            })?;

        Ok(!statuses.is_empty())
    }

    /// Stage every change in the working tree, untracked files included.
    ///
    /// Equivalent to `git add -A`: additions, modifications, and deletions
    /// all land in the index. Ignored files are not added.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .map_err(|e| GitError::Internal {
                message: format!("failed to stage changes: {}", e.message()),
            })?;

        // add_all does not record deletions of tracked files; update_all does.
        index
            .update_all(["*"], None)
            .map_err(|e| GitError::Internal {
                message: format!("failed to stage deletions: {}", e.message()),
            })?;

        index.write().map_err(|e| GitError::Internal {
            message: format!("failed to write index: {}", e.message()),
        })?;

        Ok(())
    }

    /// Commit the index onto HEAD with the configured identity.
    ///
    /// With `signoff`, the standard `Signed-off-by` trailer is appended to
    /// the message. Hooks do not run; commits are created through the
    /// object database directly.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn
    pub fn commit(&self, message: &str, signoff: bool) -> Result<Oid, GitError> {
        let mut index = self.repo.index().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        let tree_id = index.write_tree().map_err(|e| GitError::Internal {
            message: format!("failed to write tree: {}", e.message()),
        })?;
        let tree = self.repo.find_tree(tree_id).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let message = if signoff {
            append_signoff(message, &self.config.user_name, &self.config.user_email)
        } else {
            message.to_string()
        };

        let signature = self.signature()?;
        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                &message,
                &tree,
                &[&head],
            )
            .map_err(|e| GitError::Internal {
                message: format!("failed to commit: {}", e.message()),
            })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Replay a commit onto HEAD.
    ///
    /// The pick keeps the original author; the configured identity becomes
    /// the committer. A pick whose resulting tree is identical to HEAD is
    /// reported as [`CherryPickOutcome::Empty`] and leaves no commit behind.
    ///
    /// # Errors
    ///
    /// - [`GitError::CherryPickConflict`] if the commit does not apply
    ///   cleanly; HEAD, index, and working tree are restored first
    pub fn cherry_pick(&self, oid: &Oid) -> Result<CherryPickOutcome, GitError> {
        let commit = self.find_commit(oid)?;

        self.repo
            .cherrypick(&commit, None)
            .map_err(|e| GitError::Internal {
                message: format!("cherry-pick of {} failed: {}", oid.short(7), e.message()),
            })?;

        let mut index = self.repo.index().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        if index.has_conflicts() {
            self.restore_head()?;
            return Err(GitError::CherryPickConflict {
                oid: oid.to_string(),
            });
        }

        let tree_id = index.write_tree().map_err(|e| GitError::Internal {
            message: format!("failed to write tree: {}", e.message()),
        })?;

        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        if tree_id == head.tree_id() {
            // The change is already present on this base; drop the pick.
            self.repo.cleanup_state().map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            return Ok(CherryPickOutcome::Empty);
        }

        let tree = self.repo.find_tree(tree_id).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        let committer = self.signature()?;
        let new_oid = self
            .repo
            .commit(
                Some("HEAD"),
                &commit.author(),
                &committer,
                commit.message().unwrap_or(""),
                &tree,
                &[&head],
            )
            .map_err(|e| GitError::Internal {
                message: format!("failed to record cherry-pick: {}", e.message()),
            })?;

        self.repo.cleanup_state().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        Oid::new(new_oid.to_string())
            .map(CherryPickOutcome::Applied)
            .map_err(|e| e.into())
    }

    /// Reset HEAD, index, and working tree to the HEAD commit and clear
    /// any in-progress operation state.
    fn restore_head(&self) -> Result<(), GitError> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel(git2::ObjectType::Commit))
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        self.repo
            .reset(&head, git2::ResetType::Hard, None)
            .map_err(|e| GitError::Internal {
                message: format!("failed to reset to HEAD: {}", e.message()),
            })?;

        self.repo.cleanup_state().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })
    }

    // =========================================================================
    // History Queries
    // =========================================================================

    /// List commits reachable from `tip` but not from `base`, oldest first.
    ///
    /// This is the replay order for rebuilding a branch: walking the result
    /// and cherry-picking each commit reproduces the range on a new base.
    pub fn commits_in_range(&self, base: &Oid, tip: &Oid) -> Result<Vec<Oid>, GitError> {
        let base_oid = git2::Oid::from_str(base.as_str())
            .map_err(|e| GitError::from_git2(e, base.as_str()))?;
        let tip_oid =
            git2::Oid::from_str(tip.as_str()).map_err(|e| GitError::from_git2(e, tip.as_str()))?;

        let mut revwalk = self.repo.revwalk().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        revwalk.push(tip_oid).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        revwalk.hide(base_oid).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut commits = Vec::new();
        for entry in revwalk {
            let oid = entry.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            commits.push(Oid::new(oid.to_string())?);
        }

        Ok(commits)
    }

    /// Count commits reachable from `tip` but not from `base`.
    pub fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError> {
        Ok(self.commits_in_range(base, tip)?.len())
    }

    /// List the paths whose content differs between two commits' trees.
    ///
    /// Non-empty iff the trees differ.
    pub fn diff_name_only(&self, a: &Oid, b: &Oid) -> Result<Vec<String>, GitError> {
        let tree_a = self
            .find_commit(a)?
            .tree()
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
        let tree_b = self
            .find_commit(b)?
            .tree()
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&tree_a), Some(&tree_b), None)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path());
            if let Some(path) = path {
                paths.push(path.to_string_lossy().into_owned());
            }
        }

        Ok(paths)
    }

    /// Check whether two commits' trees differ.
    pub fn has_diff(&self, a: &Oid, b: &Oid) -> Result<bool, GitError> {
        Ok(!self.diff_name_only(a, b)?.is_empty())
    }

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;

        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .with_timezone(&chrono::Utc);

        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }

    /// Get the parent OIDs of a commit.
    ///
    /// Returns empty vec for root commits, multiple OIDs for merge commits.
    pub fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
        let commit = self.find_commit(oid)?;

        let mut parents = Vec::new();
        for parent in commit.parents() {
            parents.push(Oid::new(parent.id().to_string())?);
        }

        Ok(parents)
    }

    /// Look up a commit by OID.
    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    // =========================================================================
    // Remote Transfer
    // =========================================================================

    /// Fetch a specific ref from a remote.
    ///
    /// The refspec must map the source onto a local destination ref
    /// (`src:dst`, optionally prefixed with `+` to force). Delegates to the
    /// git CLI so the environment's credential configuration applies.
    ///
    /// # Returns
    ///
    /// The OID of the fetched ref tip.
    ///
    /// # Errors
    ///
    /// - [`GitError::Internal`] if the fetch fails or the refspec names no
    ///   destination
    /// - [`GitError::RefNotFound`] if the destination cannot be resolved
    ///   after the fetch
    ///
    /// # Example
    ///
    /// ```ignore
    /// let oid = git.fetch_ref(
    ///     "origin",
    ///     "+refs/heads/main:refs/remotes/origin/main",
    /// )?;
    /// ```
    pub fn fetch_ref(&self, remote: &str, refspec: &str) -> Result<Oid, GitError> {
        use std::process::Command;

        let output = Command::new("git")
            .args(["fetch", remote, refspec])
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run git fetch: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Internal {
                message: format!("git fetch {} {} failed: {}", remote, refspec, stderr.trim()),
            });
        }

        // Refspec format: [+]source:destination
        let target_ref = match refspec.split(':').next_back() {
            Some(dst) if refspec.contains(':') => dst,
            _ => {
                return Err(GitError::Internal {
                    message: format!("refspec '{}' names no destination ref", refspec),
                })
            }
        };

        self.resolve_ref(target_ref)
    }

    /// Push a local branch to a remote.
    ///
    /// The engine never calls this; it exists for the caller's publish step
    /// after a reconcile reports something to push. Delegates to the git CLI
    /// for the same reason as [`Git::fetch_ref`].
    pub fn push_branch(
        &self,
        remote: &str,
        branch: &BranchName,
        force: bool,
    ) -> Result<(), GitError> {
        use std::process::Command;

        let refspec = format!("{0}:{0}", branch.as_str());
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.push(remote);
        args.push(&refspec);

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run git push: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Internal {
                message: format!("git push {} {} failed: {}", remote, refspec, stderr.trim()),
            });
        }

        Ok(())
    }
}

/// Append the standard `Signed-off-by` trailer to a commit message.
fn append_signoff(message: &str, name: &str, email: &str) -> String {
    format!(
        "{}\n\nSigned-off-by: {} <{}>",
        message.trim_end(),
        name,
        email
    )
}
