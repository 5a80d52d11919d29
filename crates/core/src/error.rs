// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy shared by every layer of the flow engine.
//!
//! Each variant corresponds 1:1 to an abstract error kind named by the core
//! design: a paused or failed run always carries one of these, never a raw
//! `io::Error` or `rusqlite::Error` — lower layers convert at their boundary.

use std::fmt;

/// Abstract error kinds a step, the controller, or the supervisor can raise.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid on-disk configuration. The flow never starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Ticket or dispatch frontmatter failed to parse or failed schema.
    #[error("lint error in {path}: {}", errors.join("; "))]
    Lint { path: String, errors: Vec<String> },

    /// The supervisor could not spawn or initialize the agent subprocess.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// The subprocess died mid-turn.
    #[error("backend disconnected: {reason}")]
    BackendDisconnected {
        reason: String,
        /// Bounded preview of the offending stdout line, if any.
        preview: Option<String>,
    },

    /// The agent returned a JSON-RPC error response.
    #[error("backend response error {code}: {message}")]
    BackendResponseError { code: i64, message: String },

    /// No progress within the stall timeout.
    #[error("turn stalled after {timeout_secs}s")]
    TurnStalled { timeout_secs: u64 },

    /// The resume gate rejected a resume attempt.
    #[error("resume blocked: {reason}")]
    ResumeBlocked { reason: String },

    /// The reconciler found a `running` run with no live worker.
    #[error("worker missing for run {run_id}")]
    WorkerMissing { run_id: String },

    /// Anything else. The flow transitions to `failed`.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// The stable string tag used in `FlowRun.error_message` prefixes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Lint { .. } => "lint_error",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::BackendDisconnected { .. } => "backend_disconnected",
            Self::BackendResponseError { .. } => "backend_response_error",
            Self::TurnStalled { .. } => "turn_stalled",
            Self::ResumeBlocked { .. } => "resume_blocked",
            Self::WorkerMissing { .. } => "worker_missing",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("json: {e}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
