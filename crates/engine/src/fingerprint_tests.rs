use std::fs;
use std::thread::sleep;
use std::time::Duration;

use tempfile::tempdir;

use super::*;

#[test]
fn same_tree_yields_same_fingerprint() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "hello").expect("write");
    let a = repo_fingerprint(dir.path()).expect("fingerprint");
    let b = repo_fingerprint(dir.path()).expect("fingerprint");
    assert_eq!(a, b);
}

#[test]
fn touching_a_file_changes_the_fingerprint() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "hello").expect("write");
    let before = repo_fingerprint(dir.path()).expect("fingerprint");

    sleep(Duration::from_millis(10));
    fs::write(dir.path().join("a.txt"), "hello!!").expect("write");
    let after = repo_fingerprint(dir.path()).expect("fingerprint");

    assert_ne!(before, after);
}

#[test]
fn runs_directory_under_codex_autorunner_is_excluded() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join(".codex-autorunner/runs/run-1")).expect("mkdir");
    fs::write(dir.path().join(".codex-autorunner/runs/run-1/scratch.txt"), "x").expect("write");
    let before = repo_fingerprint(dir.path()).expect("fingerprint");

    fs::write(dir.path().join(".codex-autorunner/runs/run-1/scratch.txt"), "changed").expect("write");
    let after = repo_fingerprint(dir.path()).expect("fingerprint");

    assert_eq!(before, after);
}

#[test]
fn git_directory_is_excluded() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join(".git")).expect("mkdir");
    fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").expect("write");
    let before = repo_fingerprint(dir.path()).expect("fingerprint");

    fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/other").expect("write");
    let after = repo_fingerprint(dir.path()).expect("fingerprint");

    assert_eq!(before, after);
}

#[test]
fn tickets_directory_changes_are_tracked() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join(".codex-autorunner/tickets")).expect("mkdir");
    fs::write(
        dir.path().join(".codex-autorunner/tickets/TICKET-001.md"),
        "---\nagent: codex\ndone: false\n---\nbody\n",
    )
    .expect("write");
    let before = repo_fingerprint(dir.path()).expect("fingerprint");

    sleep(Duration::from_millis(10));
    fs::write(
        dir.path().join(".codex-autorunner/tickets/TICKET-001.md"),
        "---\nagent: codex\ndone: true\n---\nbody\n",
    )
    .expect("write");
    let after = repo_fingerprint(dir.path()).expect("fingerprint");

    assert_ne!(before, after);
}
