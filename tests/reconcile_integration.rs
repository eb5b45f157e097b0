//! Integration tests for the reconciliation engine.
//!
//! Each test drives the engine against a working checkout wired to a local
//! upstream repository, the way an automated workflow would use it. Raw git
//! commands arrange repository state; the crate under test does the work
//! being verified.
//!
//! The fixture mirrors the workflow environment: a base branch
//! `tests/master` holding `tracked-file.txt`, and a pull request branch
//! `tests/pr/patch` that the engine creates or rewrites. Between workflow
//! runs the checkout is restored to the base tip, as a fresh automation
//! checkout would be.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use reweave::core::naming::TEMP_BRANCH_SUFFIX;
use reweave::core::types::{BranchName, Oid};
use reweave::engine::{
    create_or_update_branch, try_fetch, BranchAction, ReconcileError, ReconcileOutcome,
    ReconcileRequest,
};
use reweave::git::{Git, VcsConfig, DEFAULT_REMOTE};

const BASE: &str = "tests/master";
const BRANCH: &str = "tests/pr/patch";
const TRACKED: &str = "tracked-file.txt";

/// A working checkout wired to a bare upstream.
struct Fixture {
    _upstream: TempDir,
    checkout: TempDir,
    init_commit: Oid,
}

impl Fixture {
    fn new() -> Self {
        let upstream = TempDir::new().expect("failed to create upstream dir");
        run_git(upstream.path(), &["init", "--bare"]);

        let checkout = TempDir::new().expect("failed to create checkout dir");
        run_git(checkout.path(), &["init"]);
        run_git(checkout.path(), &["config", "user.email", "test@example.com"]);
        run_git(checkout.path(), &["config", "user.name", "Test User"]);
        run_git(checkout.path(), &["checkout", "-b", BASE]);

        std::fs::write(checkout.path().join(TRACKED), "INIT").unwrap();
        run_git(checkout.path(), &["add", TRACKED]);
        run_git(checkout.path(), &["commit", "-m", "Initial commit"]);

        run_git(
            checkout.path(),
            &["remote", "add", "origin", upstream.path().to_str().unwrap()],
        );
        run_git(checkout.path(), &["push", "origin", BASE]);
        run_git(checkout.path(), &["fetch", "origin"]);

        let init_commit = Git::open(checkout.path(), test_config())
            .expect("failed to open checkout")
            .head_oid()
            .unwrap();

        Self {
            _upstream: upstream,
            checkout,
            init_commit,
        }
    }

    fn path(&self) -> &Path {
        self.checkout.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path(), test_config()).expect("failed to open checkout")
    }

    /// Run the engine.
    fn reconcile(&self, message: &str, base: Option<&str>, branch: &str) -> ReconcileOutcome {
        let req = ReconcileRequest {
            message: message.to_string(),
            base: base.map(name),
            branch: name(branch),
            signoff: false,
        };
        create_or_update_branch(&self.git(), &req).expect("reconcile failed")
    }

    /// The caller's publish step after a non-none outcome.
    fn publish(&self, branch: &str) {
        self.git()
            .push_branch(DEFAULT_REMOTE, &name(branch), true)
            .expect("push failed");
    }

    /// Restore the checkout to the state a fresh workflow run would see:
    /// on the base branch, at the initially published tip, clean tree.
    fn restore_working_base(&self) {
        run_git(self.path(), &["checkout", BASE]);
        run_git(self.path(), &["reset", "--hard", self.init_commit.as_str()]);
    }

    fn write(&self, file: &str, content: &str) {
        std::fs::write(self.path().join(file), content).unwrap();
    }

    /// Advance the upstream base by two commits (c1 rewrites the tracked
    /// file, c2 adds a new file) without moving the local base branch.
    fn advance_upstream_base(&self) {
        run_git(
            self.path(),
            &["checkout", "--detach", &format!("origin/{BASE}")],
        );
        self.write(TRACKED, "V2");
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", "c1"]);
        self.write("added-file.txt", "NEW");
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", "c2"]);
        run_git(self.path(), &["push", "origin", &format!("HEAD:{BASE}")]);
        run_git(self.path(), &["checkout", BASE]);
    }

    /// Commit summaries of a ref, newest first.
    fn log_summaries(&self, refname: &str) -> Vec<String> {
        git_stdout(self.path(), &["log", "--format=%s", refname])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// File content at a ref.
    fn file_on(&self, refname: &str, file: &str) -> String {
        git_stdout(self.path(), &["show", &format!("{refname}:{file}")])
    }

    /// Invariants that hold after every reconcile: HEAD is back on the
    /// entry branch and no scratch branch survived.
    fn assert_engine_invariants(&self, entry_branch: &str) {
        let git = self.git();
        assert_eq!(
            git.current_branch().unwrap().unwrap().as_str(),
            entry_branch,
            "HEAD was not restored to the entry branch"
        );
        for branch in git.list_branches().unwrap() {
            assert!(
                !branch.as_str().ends_with(TEMP_BRANCH_SUFFIX),
                "scratch branch leaked: {branch}"
            );
        }
    }
}

fn test_config() -> VcsConfig {
    VcsConfig::new("Test User", "test@example.com")
}

fn name(branch: &str) -> BranchName {
    BranchName::new(branch).unwrap()
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command and return its stdout.
fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    String::from_utf8(output.stdout).unwrap()
}

/// Run a git command and report whether it succeeded.
fn git_succeeds(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn clean_tree_with_no_remote_branch_is_a_noop() {
    let fx = Fixture::new();

    let outcome = fx.reconcile("m1", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::None);
    assert!(!fx.git().branch_exists(&name(BRANCH)));
    assert_eq!(fx.log_summaries(BASE), vec!["Initial commit"]);
    fx.assert_engine_invariants(BASE);
}

#[test]
fn uncommitted_changes_create_the_branch() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");

    let outcome = fx.reconcile("m1", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert!(outcome.has_diff_with_base);
    assert_eq!(fx.file_on(BRANCH, TRACKED), "X");
    assert_eq!(fx.log_summaries(BRANCH), vec!["m1", "Initial commit"]);
    fx.assert_engine_invariants(BASE);

    // A created branch has no upstream counterpart configured.
    assert!(!git_succeeds(
        fx.path(),
        &["rev-parse", "--abbrev-ref", &format!("{BRANCH}@{{upstream}}")]
    ));
}

#[test]
fn further_changes_update_the_branch() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");
    fx.reconcile("m1", None, BRANCH);
    fx.publish(BRANCH);
    fx.restore_working_base();

    fx.write(TRACKED, "Y");
    let outcome = fx.reconcile("m2", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Updated);
    assert!(outcome.has_diff_with_base);
    assert_eq!(fx.file_on(BRANCH, TRACKED), "Y");
    assert_eq!(fx.log_summaries(BRANCH), vec!["m2", "Initial commit"]);
    fx.assert_engine_invariants(BASE);
}

#[test]
fn reproducing_published_changes_is_a_noop() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");
    fx.reconcile("m1", None, BRANCH);
    fx.publish(BRANCH);
    fx.restore_working_base();

    // The same change again, under a different message.
    fx.write(TRACKED, "X");
    let outcome = fx.reconcile("m3", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::None);
    assert_eq!(fx.file_on(&format!("origin/{BRANCH}"), TRACKED), "X");
    assert_eq!(
        fx.log_summaries(&format!("origin/{BRANCH}")),
        vec!["m1", "Initial commit"]
    );
    fx.assert_engine_invariants(BASE);
}

#[test]
fn clean_tree_rebuilds_branch_back_to_base() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");
    fx.reconcile("m1", None, BRANCH);
    fx.publish(BRANCH);
    fx.restore_working_base();

    // No changes this run: the published branch should collapse to the base.
    let outcome = fx.reconcile("m4", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Updated);
    assert!(!outcome.has_diff_with_base);
    assert_eq!(fx.file_on(BRANCH, TRACKED), "INIT");
    assert_eq!(fx.log_summaries(BRANCH), vec!["Initial commit"]);
    fx.assert_engine_invariants(BASE);

    // has_diff_with_base = false means the trees really are identical.
    let git = fx.git();
    let branch_tip = git.resolve_ref(&format!("refs/heads/{BRANCH}")).unwrap();
    let base_tip = git
        .resolve_ref(&format!("refs/remotes/origin/{BASE}"))
        .unwrap();
    assert!(!git.has_diff(&branch_tip, &base_tip).unwrap());
}

#[test]
fn base_movement_with_content_already_on_base() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");
    fx.reconcile("m1", None, BRANCH);
    fx.publish(BRANCH);
    fx.restore_working_base();

    // The base gains c1 and c2 upstream; the workflow then reproduces
    // exactly the content those commits added.
    fx.advance_upstream_base();
    fx.write(TRACKED, "V2");
    fx.write("added-file.txt", "NEW");

    let outcome = fx.reconcile("m5", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Updated);
    assert!(!outcome.has_diff_with_base);
    assert_eq!(
        fx.log_summaries(BRANCH),
        vec!["c2", "c1", "Initial commit"]
    );
    assert_eq!(fx.file_on(BRANCH, TRACKED), "V2");
    assert_eq!(fx.file_on(BRANCH, "added-file.txt"), "NEW");
    fx.assert_engine_invariants(BASE);
}

#[test]
fn working_base_distinct_from_base_creates_branch() {
    let fx = Fixture::new();
    run_git(fx.path(), &["checkout", "-b", "NOT_BASE_BRANCH"]);
    fx.write(TRACKED, "Z");

    let outcome = fx.reconcile("m6", Some(BASE), BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert!(outcome.has_diff_with_base);
    assert_eq!(fx.file_on(BRANCH, TRACKED), "Z");
    assert_eq!(fx.log_summaries(BRANCH), vec!["m6", "Initial commit"]);
    fx.assert_engine_invariants("NOT_BASE_BRANCH");
}

// =============================================================================
// Engine Properties
// =============================================================================

#[test]
fn second_run_after_publish_is_a_noop() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");

    let first = fx.reconcile("m1", None, BRANCH);
    assert_eq!(first.action, BranchAction::Created);
    fx.publish(BRANCH);

    // No restore in between: the staging commit from the first run is
    // still sitting on the working base.
    let second = fx.reconcile("m1", None, BRANCH);
    assert_eq!(second.action, BranchAction::None);
    fx.assert_engine_invariants(BASE);
}

#[test]
fn workflow_commits_replay_in_original_order() {
    let fx = Fixture::new();

    // Commits made on the working base during the workflow, plus an
    // uncommitted change on top.
    fx.write("alpha.txt", "alpha");
    run_git(fx.path(), &["add", "-A"]);
    run_git(fx.path(), &["commit", "-m", "Add alpha"]);
    fx.write("beta.txt", "beta");
    run_git(fx.path(), &["add", "-A"]);
    run_git(fx.path(), &["commit", "-m", "Add beta"]);
    fx.write(TRACKED, "X");

    let outcome = fx.reconcile("m7", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert_eq!(
        fx.log_summaries(BRANCH),
        vec!["m7", "Add beta", "Add alpha", "Initial commit"]
    );
    assert_eq!(fx.file_on(BRANCH, "alpha.txt"), "alpha");
    assert_eq!(fx.file_on(BRANCH, "beta.txt"), "beta");
    fx.assert_engine_invariants(BASE);
}

#[test]
fn untracked_files_are_captured() {
    let fx = Fixture::new();
    fx.write("notes.txt", "untracked content");

    let outcome = fx.reconcile("m1", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert!(outcome.has_diff_with_base);
    assert_eq!(fx.file_on(BRANCH, "notes.txt"), "untracked content");
    fx.assert_engine_invariants(BASE);
}

#[test]
fn leftover_scratch_branch_is_recovered() {
    let fx = Fixture::new();

    // Simulate an interrupted earlier run.
    run_git(
        fx.path(),
        &["branch", &format!("{BRANCH}{TEMP_BRANCH_SUFFIX}")],
    );

    fx.write(TRACKED, "X");
    let outcome = fx.reconcile("m1", None, BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert_eq!(fx.file_on(BRANCH, TRACKED), "X");
    fx.assert_engine_invariants(BASE);
}

#[test]
fn detached_head_is_rejected() {
    let fx = Fixture::new();
    run_git(fx.path(), &["checkout", "--detach"]);

    let req = ReconcileRequest::new("m1", name(BRANCH));
    let err = create_or_update_branch(&fx.git(), &req).unwrap_err();

    assert!(matches!(err, ReconcileError::DetachedHead));
}

#[test]
fn local_base_branch_created_when_missing() {
    let fx = Fixture::new();
    run_git(fx.path(), &["checkout", "-b", "NOT_BASE_BRANCH"]);
    run_git(fx.path(), &["branch", "-D", BASE]);
    fx.write(TRACKED, "Z");

    let outcome = fx.reconcile("m8", Some(BASE), BRANCH);

    assert_eq!(outcome.action, BranchAction::Created);
    assert!(fx.git().branch_exists(&name(BASE)));
    assert_eq!(
        git_stdout(
            fx.path(),
            &["rev-parse", "--abbrev-ref", &format!("{BASE}@{{upstream}}")]
        )
        .trim(),
        format!("origin/{BASE}")
    );
    fx.assert_engine_invariants("NOT_BASE_BRANCH");
}

#[test]
fn signoff_is_applied_to_the_staging_commit() {
    let fx = Fixture::new();
    fx.write(TRACKED, "X");

    let req = ReconcileRequest {
        message: "m9".to_string(),
        base: None,
        branch: name(BRANCH),
        signoff: true,
    };
    let outcome = create_or_update_branch(&fx.git(), &req).expect("reconcile failed");
    assert_eq!(outcome.action, BranchAction::Created);

    let git = fx.git();
    let tip = git.resolve_ref(&format!("refs/heads/{BRANCH}")).unwrap();
    let info = git.commit_info(&tip).unwrap();
    assert_eq!(info.summary, "m9");
    assert!(info
        .message
        .contains("Signed-off-by: Test User <test@example.com>"));
}

#[test]
fn try_fetch_reports_remote_existence() {
    let fx = Fixture::new();
    let git = fx.git();

    assert!(try_fetch(&git, &name(BASE)));
    assert!(!try_fetch(&git, &name("does-not-exist")));
}
