// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_run_is_pending_and_not_terminal() {
    let run = FlowRun::new("ticket_flow", serde_json::json!({}), 1000);
    assert_eq!(run.status, FlowStatus::Pending);
    assert!(run.current_step.is_none());
    assert!(run.upholds_terminality_invariant());
}

#[test]
fn terminality_invariant_rejects_terminal_with_current_step() {
    let mut run = FlowRun::new("ticket_flow", serde_json::json!({}), 1000);
    run.status = FlowStatus::Completed;
    run.current_step = Some("run_ticket".to_string());
    run.finished_at = Some(2000);
    assert!(!run.upholds_terminality_invariant());
}

#[test]
fn run_id_roundtrips_through_string() {
    let id = FlowRunId::new();
    let parsed = FlowRunId::from_string(id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn continue_to_picks_lexicographic_minimum() {
    let outcome = StepOutcome::ContinueTo {
        next: vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()],
        output: serde_json::json!({}),
    };
    assert_eq!(outcome.next_step(), Some("alpha"));
}

#[test]
fn event_type_display_matches_spec_tags() {
    assert_eq!(FlowEventType::FlowStarted.to_string(), "flow_started");
    assert_eq!(FlowEventType::DispatchCreated.to_string(), "dispatch_created");
    assert_eq!(
        FlowEventType::Custom("diff_updated".to_string()).to_string(),
        "diff_updated"
    );
}
