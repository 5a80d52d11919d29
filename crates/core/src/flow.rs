// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow run / flow event / step execution data model (spec §3).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Unique id of a flow run, serialized as a UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRunId(pub Uuid);

impl FlowRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: impl AsRef<str>) -> Result<Self, CoreError> {
        Uuid::parse_str(s.as_ref())
            .map(Self)
            .map_err(|e| CoreError::Internal(format!("invalid run id: {e}")))
    }

    pub fn as_str_buf(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FlowRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FlowRunId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

/// `FlowRun.status` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Stopped,
}

crate::simple_display! {
    FlowStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Stopped => "stopped",
    }
}

impl FlowStatus {
    /// Terminal statuses never run again in place; resuming makes a fresh
    /// decision (paused is NOT terminal — it is the only resumable state).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

/// `FlowEvent.event_type` (spec §3). The set is open (`…`); callers may
/// append a namespaced custom tag via `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEventType {
    FlowStarted,
    FlowCompleted,
    FlowFailed,
    FlowStopped,
    FlowResumed,
    FlowPaused,
    StepStarted,
    StepCompleted,
    StepFailed,
    DiffUpdated,
    DispatchCreated,
    #[serde(rename = "custom")]
    Custom(String),
}

impl fmt::Display for FlowEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlowStarted => write!(f, "flow_started"),
            Self::FlowCompleted => write!(f, "flow_completed"),
            Self::FlowFailed => write!(f, "flow_failed"),
            Self::FlowStopped => write!(f, "flow_stopped"),
            Self::FlowResumed => write!(f, "flow_resumed"),
            Self::FlowPaused => write!(f, "flow_paused"),
            Self::StepStarted => write!(f, "step_started"),
            Self::StepCompleted => write!(f, "step_completed"),
            Self::StepFailed => write!(f, "step_failed"),
            Self::DiffUpdated => write!(f, "diff_updated"),
            Self::DispatchCreated => write!(f, "dispatch_created"),
            Self::Custom(tag) => write!(f, "{tag}"),
        }
    }
}

/// Append-only, monotonically sequenced per run (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub run_id: FlowRunId,
    pub seq: i64,
    pub event_type: FlowEventType,
    pub ts: u64,
    pub data: serde_json::Value,
}

/// One row per `(run_id, step_name, attempt)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    pub run_id: FlowRunId,
    pub step_name: String,
    pub attempt: u32,
    pub status: StepStatus,
    pub started_at: u64,
    pub finished_at: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Completed,
    ContinueTo,
    Paused,
    Stopped,
    Failed,
}

crate::simple_display! {
    StepStatus {
        Running => "running",
        Completed => "completed",
        ContinueTo => "continue_to",
        Paused => "paused",
        Stopped => "stopped",
        Failed => "failed",
    }
}

/// Tagged union returned by a step function (spec §4.6, §9 redesign flag:
/// "every step returns a `StepOutcome`; any native panic is mapped to
/// `StepOutcome::Fail`").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    Complete { output: serde_json::Value },
    ContinueTo { next: Vec<String>, output: serde_json::Value },
    Pause { output: serde_json::Value, reason: Option<String> },
    Stop { output: serde_json::Value },
    Fail { error: String },
}

impl StepOutcome {
    pub fn status(&self) -> StepStatus {
        match self {
            Self::Complete { .. } => StepStatus::Completed,
            Self::ContinueTo { .. } => StepStatus::ContinueTo,
            Self::Pause { .. } => StepStatus::Paused,
            Self::Stop { .. } => StepStatus::Stopped,
            Self::Fail { .. } => StepStatus::Failed,
        }
    }

    /// The merged-into-state payload, if any (spec §4.6.3.c: "Merge
    /// `outcome.output` into `state`").
    pub fn output(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Complete { output }
            | Self::ContinueTo { output, .. }
            | Self::Pause { output, .. }
            | Self::Stop { output } => Some(output),
            Self::Fail { .. } => None,
        }
    }

    /// Deterministic tie-break: `min(next_set)` by lexicographic order.
    pub fn next_step(&self) -> Option<&str> {
        match self {
            Self::ContinueTo { next, .. } => next.iter().map(String::as_str).min(),
            _ => None,
        }
    }
}

/// `FlowRun` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRun {
    pub id: FlowRunId,
    pub flow_type: String,
    pub status: FlowStatus,
    pub current_step: Option<String>,
    pub input_data: serde_json::Value,
    pub state: serde_json::Value,
    pub metadata: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub stop_requested: bool,
}

impl FlowRun {
    pub fn new(flow_type: impl Into<String>, input_data: serde_json::Value, now_ms: u64) -> Self {
        Self {
            id: FlowRunId::new(),
            flow_type: flow_type.into(),
            status: FlowStatus::Pending,
            current_step: None,
            input_data,
            state: serde_json::json!({}),
            metadata: serde_json::json!({}),
            error_message: None,
            created_at: now_ms,
            started_at: None,
            finished_at: None,
            stop_requested: false,
        }
    }

    /// Invariant (spec §3): terminal status ⇔ `current_step is null` ⇔
    /// `finished_at` set.
    pub fn upholds_terminality_invariant(&self) -> bool {
        let terminal = self.status.is_terminal();
        terminal == self.current_step.is_none() && terminal == self.finished_at.is_some()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn builder() -> FlowRunBuilder {
        FlowRunBuilder::default()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FlowRunBuilder {
    flow_type: String,
    input_data: serde_json::Value,
    status: FlowStatus,
    current_step: Option<String>,
    now_ms: u64,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FlowRunBuilder {
    fn default() -> Self {
        Self {
            flow_type: "ticket_flow".to_string(),
            input_data: serde_json::json!({}),
            status: FlowStatus::Pending,
            current_step: None,
            now_ms: 0,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FlowRunBuilder {
    pub fn flow_type(mut self, v: impl Into<String>) -> Self {
        self.flow_type = v.into();
        self
    }

    pub fn input_data(mut self, v: serde_json::Value) -> Self {
        self.input_data = v;
        self
    }

    pub fn status(mut self, v: FlowStatus) -> Self {
        self.status = v;
        self
    }

    pub fn current_step(mut self, v: impl Into<String>) -> Self {
        self.current_step = Some(v.into());
        self
    }

    pub fn now_ms(mut self, v: u64) -> Self {
        self.now_ms = v;
        self
    }

    pub fn build(self) -> FlowRun {
        let mut run = FlowRun::new(self.flow_type, self.input_data, self.now_ms);
        run.status = self.status;
        run.current_step = self.current_step;
        run
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
