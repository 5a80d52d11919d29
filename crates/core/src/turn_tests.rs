// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn turn_error_captures_kind_and_message() {
    let core_err = CoreError::BackendDisconnected {
        reason: "subprocess exited".to_string(),
        preview: None,
    };
    let turn_err: TurnError = (&core_err).into();
    assert_eq!(turn_err.kind, "backend_disconnected");
    assert!(turn_err.message.contains("subprocess exited"));
}

#[test]
fn default_approval_decision_is_cancel() {
    assert_eq!(ApprovalDecision::default(), ApprovalDecision::Cancel);
}

#[test]
fn turn_result_success_has_no_error() {
    let result = TurnResult {
        text: "done".to_string(),
        agent_id: AgentId::new("codex"),
        conversation_id: Some("thread-1".to_string()),
        turn_id: Some("turn-1".to_string()),
        error: None,
    };
    assert!(result.is_success());
}
