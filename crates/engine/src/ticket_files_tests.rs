use std::fs;

use tempfile::tempdir;

use super::*;

fn write_ticket(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write ticket");
}

#[test]
fn lists_tickets_sorted_by_index() {
    let dir = tempdir().expect("tempdir");
    write_ticket(dir.path(), "TICKET-002.md", "---\nagent: codex\ndone: false\n---\nbody\n");
    write_ticket(dir.path(), "TICKET-001.md", "---\nagent: codex\ndone: false\n---\nbody\n");
    write_ticket(dir.path(), "notes.txt", "ignored");

    let listed = list_ticket_paths(dir.path()).expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].0, TicketIndex(1));
    assert_eq!(listed[1].0, TicketIndex(2));
}

#[test]
fn missing_directory_lists_empty() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    let listed = list_ticket_paths(&missing).expect("list");
    assert!(listed.is_empty());
}

#[test]
fn reads_valid_ticket() {
    let dir = tempdir().expect("tempdir");
    write_ticket(
        dir.path(),
        "TICKET-003.md",
        "---\nagent: codex\ndone: false\ntitle: Fix the bug\n---\nDo the work.\n",
    );
    let ticket = read_ticket(&dir.path().join("TICKET-003.md")).expect("ticket");
    assert_eq!(ticket.index, TicketIndex(3));
    assert_eq!(ticket.frontmatter.agent, "codex");
    assert_eq!(ticket.body, "Do the work.\n");
}

#[test]
fn invalid_frontmatter_is_a_lint_error() {
    let dir = tempdir().expect("tempdir");
    write_ticket(dir.path(), "TICKET-004.md", "---\ndone: false\n---\nbody\n");
    let err = read_ticket(&dir.path().join("TICKET-004.md")).expect_err("lint error");
    match err {
        TicketReadError::Lint { errors, .. } => assert!(!errors.is_empty()),
        TicketReadError::Io { .. } => panic!("expected lint error"),
    }
}

#[test]
fn ticket_is_done_fails_open_to_false() {
    let dir = tempdir().expect("tempdir");
    write_ticket(dir.path(), "TICKET-005.md", "not a ticket at all, no frontmatter");
    assert!(!ticket_is_done(&dir.path().join("TICKET-005.md")));
}

#[test]
fn duplicate_indices_are_reported() {
    let dir = tempdir().expect("tempdir");
    write_ticket(dir.path(), "TICKET-001.md", "---\nagent: codex\ndone: false\n---\nbody\n");
    write_ticket(dir.path(), "TICKET-001-dup.md", "---\nagent: codex\ndone: false\n---\nbody\n");
    let errors = lint_ticket_directory(dir.path()).expect("lint");
    assert!(errors.iter().any(|e| e.contains("Duplicate ticket index 001")));
}
