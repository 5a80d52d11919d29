// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_plain_ticket_filename() {
    let (index, suffix) = parse_ticket_filename("TICKET-001.md").unwrap();
    assert_eq!(index, TicketIndex(1));
    assert_eq!(suffix, "");
}

#[test]
fn parses_ticket_filename_with_suffix() {
    let (index, suffix) = parse_ticket_filename("TICKET-042-followup.md").unwrap();
    assert_eq!(index, TicketIndex(42));
    assert_eq!(suffix, "-followup");
}

#[test]
fn rejects_non_ticket_filenames() {
    assert!(parse_ticket_filename("README.md").is_none());
    assert!(parse_ticket_filename("TICKET-1.md").is_none()); // fewer than 3 digits
    assert!(parse_ticket_filename("TICKET-001.txt").is_none());
}

#[test]
fn sentinel_agents_are_recognized() {
    assert_eq!(AgentRefKind::parse("pause"), AgentRefKind::Pause);
    assert_eq!(AgentRefKind::parse("user"), AgentRefKind::User);
    assert_eq!(
        AgentRefKind::parse("codex"),
        AgentRefKind::Registered(AgentId::new("codex"))
    );
}

#[test]
fn sentinel_classification() {
    assert!(AgentRefKind::Pause.is_sentinel());
    assert!(AgentRefKind::User.is_sentinel());
    assert!(!AgentRefKind::Registered(AgentId::new("codex")).is_sentinel());
}

#[test]
fn index_display_is_zero_padded_to_three_digits() {
    assert_eq!(TicketIndex(7).to_string(), "007");
    assert_eq!(TicketIndex(123).to_string(), "123");
}
