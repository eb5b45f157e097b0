//! core::naming
//!
//! Naming rules for the reconciler's scratch branches.
//!
//! The reconciler assembles the candidate branch tip on a scratch branch
//! before touching the target branch. The scratch name is derived
//! deterministically from the target name so that a run interrupted mid-way
//! leaves behind something the next run can recognize and delete.

use crate::core::types::BranchName;

/// Suffix reserved for scratch branches. Never pushed to a remote.
pub const TEMP_BRANCH_SUFFIX: &str = "-temp-branch";

/// Derive the scratch branch name for a target branch.
///
/// # Example
///
/// ```
/// use reweave::core::naming::temp_branch_for;
/// use reweave::core::types::BranchName;
///
/// let branch = BranchName::new("automation/update").unwrap();
/// assert_eq!(
///     temp_branch_for(&branch).as_str(),
///     "automation/update-temp-branch"
/// );
/// ```
pub fn temp_branch_for(branch: &BranchName) -> BranchName {
    // Appending the suffix to a valid branch name cannot produce a sequence
    // the validator rejects.
    BranchName::new(format!("{}{}", branch.as_str(), TEMP_BRANCH_SUFFIX))
        .expect("suffixed branch name is valid")
}

/// Check whether a branch name is one of this crate's scratch branches.
pub fn is_temp_branch(name: &BranchName) -> bool {
    name.as_str().ends_with(TEMP_BRANCH_SUFFIX)
}
