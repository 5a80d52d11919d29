// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Ticket Engine's scratch memory, persisted verbatim in
//! `FlowRun.state` (spec §9 "Restartable session state"): a fresh worker
//! reconstructs everything it needs from this blob plus the filesystem.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The ticket currently being worked, tracked across turns so a repeat
/// call to the step function knows whether the same ticket is still open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentTicket {
    pub index: u32,
    pub filename: String,
}

/// Frontmatter-lint retry tracking (spec §4.5 step 9).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintState {
    pub retries: u32,
    pub errors: Vec<String>,
}

/// Why the flow paused, recorded alongside [`PauseContext`] so the resume
/// gate can tell a wait-for-input pause from an infra/agent-error pause
/// (spec §4.6 `ResumeFlow`, condition (c)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReasonKind {
    WaitForInput,
    InfraError,
}

impl Default for PauseReasonKind {
    fn default() -> Self {
        Self::WaitForInput
    }
}

/// Snapshot taken when the flow pauses, consulted by the resume gate
/// (spec §4.6 `ResumeFlow`, spec §8 property #6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseContext {
    pub paused_reply_seq: u32,
    pub repo_fingerprint: String,
    pub reason_kind: PauseReasonKind,
}

/// The full scratch-memory shape the Ticket Engine reads and rewrites
/// every step (spec §9): `{conversation_id, turn_id, reply_seq,
/// outbox_seq, total_turns, ticket_turns, lint}` plus the bookkeeping
/// this crate adds to make resumption and the resume gate work
/// (`current_ticket`, `pause_context`, `last_agent_*`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketFlowState {
    pub total_turns: u32,
    pub ticket_turns: u32,
    pub current_ticket: Option<CurrentTicket>,
    pub reply_seq: u32,
    pub outbox_seq: u32,
    pub lint: LintState,
    pub last_agent_output: Option<String>,
    pub last_agent_id: Option<String>,
    pub last_agent_conversation_id: Option<String>,
    pub last_agent_turn_id: Option<String>,
    pub last_agent_error: Option<String>,
    pub pause_context: Option<PauseContext>,
}

impl TicketFlowState {
    /// Parses flow state from the opaque JSON blob the Store hands back.
    /// Missing keys fall back to their field defaults rather than erroring,
    /// since `{}` (a brand new run) must parse cleanly.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
