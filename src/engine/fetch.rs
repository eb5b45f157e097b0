//! engine::fetch
//!
//! Best-effort retrieval of remote branches.
//!
//! Whether a branch exists on the remote is an informational input to the
//! reconciler, not a precondition, so fetch failures are reported as
//! `false` rather than raised. Anything that genuinely needs the fetched
//! ref will fail on its own when resolving it.

use crate::core::types::{BranchName, RefName};
use crate::git::{Git, DEFAULT_REMOTE};

/// Fetch `branch` from the default remote into its remote-tracking ref.
///
/// On success, `refs/remotes/origin/<branch>` holds the remote tip and the
/// call returns `true`. Any failure - the branch not existing on the
/// remote, a network error, denied access - returns `false`. Never raises.
pub fn try_fetch(git: &Git, branch: &BranchName) -> bool {
    let tracking = RefName::for_remote_branch(DEFAULT_REMOTE, branch);
    let refspec = format!("+refs/heads/{}:{}", branch.as_str(), tracking.as_str());
    git.fetch_ref(DEFAULT_REMOTE, &refspec).is_ok()
}
