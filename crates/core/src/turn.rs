// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Pool / Supervisor contract (spec §4.2, §4.3).

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::CoreError;
use crate::sandbox::SandboxPolicy;

/// A single input item sent as part of `turn/start` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInputItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TurnInputItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: "text".to_string(), text: text.into() }
    }
}

/// Approval policy accompanying `turn/start` (spec §4.3 step 4). The
/// backend's exact vocabulary is opaque; the pool forwards whatever the
/// ticket declares (defaulting to `"on-request"` if unset upstream).
pub type ApprovalPolicy = String;

/// What the Ticket Engine asks the Agent Pool to do for one turn
/// (spec §4.3).
#[derive(Debug, Clone)]
pub struct AgentTurnRequest {
    pub agent_id: AgentId,
    /// Backend thread id to resume, if any (spec §4.3 step 3).
    pub conversation_id: Option<String>,
    pub input: Vec<TurnInputItem>,
    pub approval_policy: ApprovalPolicy,
    pub sandbox_policy: SandboxPolicy,
    pub cwd: std::path::PathBuf,
}

/// Coerced completion or failure of one turn (spec §4.3 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub text: String,
    pub agent_id: AgentId,
    pub conversation_id: Option<String>,
    pub turn_id: Option<String>,
    pub error: Option<TurnError>,
}

impl TurnResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A JSON-serializable projection of [`CoreError`] suitable for persisting
/// into `state.last_agent_error` / `FlowRun.error_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnError {
    pub kind: String,
    pub message: String,
}

impl From<&CoreError> for TurnError {
    fn from(e: &CoreError) -> Self {
        Self { kind: e.kind().to_string(), message: e.to_string() }
    }
}

impl From<CoreError> for TurnError {
    fn from(e: CoreError) -> Self {
        Self::from(&e)
    }
}

/// Server-initiated approval request (spec §4.2, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub turn_id: String,
    pub kind: ApprovalKind,
    /// Raw params as sent by the backend (command, files, etc).
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalKind {
    CommandExecution,
    FileChange,
}

/// The caller's decision on an [`ApprovalRequest`] (spec §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Accept,
    Decline,
    Cancel,
    /// A structured override the backend understands but the supervisor
    /// treats opaquely.
    Override(serde_json::Value),
}

impl Default for ApprovalDecision {
    /// The configured default when no handler is installed (spec §4.2:
    /// "If no handler is configured, the supervisor returns the configured
    /// default (typically `cancel`)").
    fn default() -> Self {
        Self::Cancel
    }
}

#[cfg(test)]
#[path = "turn_tests.rs"]
mod tests;
