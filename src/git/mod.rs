//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Every repository read and
//! write the engine performs flows through this interface. No other module
//! imports `git2`.
//!
//! Repository access uses the `git2` crate. The two operations that talk to
//! a remote (`fetch_ref`, `push_branch`) shell out to the git CLI instead,
//! so whatever credential and transport configuration the environment
//! carries applies unchanged.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening, bound to an immutable commit identity
//! - Ref and branch operations (resolve, create, delete, checkout, upstream)
//! - Working tree operations (dirty check, stage-all, commit, cherry-pick)
//! - History queries (commit ranges, counts, diffs, commit metadata)
//! - Remote transfer (fetch, push)
//!
//! # Invariants
//!
//! - All operations return strong types (`Oid`, `BranchName`, `RefName`)
//! - Errors are categorized into typed [`GitError`] variants
//! - The driver never decides; policy lives in the engine

mod interface;

pub use interface::{
    CherryPickOutcome, CommitInfo, Git, GitError, VcsConfig, DEFAULT_REMOTE,
};
