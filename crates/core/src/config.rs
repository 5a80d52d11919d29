// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed view of `<repo>/.codex-autorunner/config.yml`.
//!
//! Parsing the YAML file is out of scope (an external collaborator owns
//! that); this module only defines the schema so the in-scope components
//! (Ticket Engine, Supervisor, Flow Controller) agree on field names and
//! defaults. A missing key never panics — every field has a default.

use serde::{Deserialize, Serialize};

/// Tunables consumed by the in-scope components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticket Engine: global turn budget before a flow pauses (§4.5 step 1).
    pub max_total_turns: u32,
    /// Ticket Engine: frontmatter lint-retry ceiling (§4.5 step 9).
    pub max_lint_retries: u32,
    /// Supervisor: bounded handle capacity per `(workspace, backend)`.
    pub max_handles: usize,
    /// Supervisor: close handles unused longer than this.
    pub idle_ttl_seconds: u64,
    /// Supervisor: fatal line-length budget for stdio framing.
    pub max_message_bytes: usize,
    /// Supervisor restart backoff, initial delay.
    pub restart_backoff_initial_seconds: f64,
    /// Supervisor restart backoff, cap.
    pub restart_backoff_max_seconds: f64,
    /// Supervisor restart backoff, jitter fraction (±10% by default).
    pub restart_backoff_jitter: f64,
    /// Supervisor: no-progress timeout that triggers recovery.
    pub turn_stall_timeout_seconds: u64,
    /// Minimum interval between two automatic subprocess recoveries.
    pub min_recovery_interval_seconds: u64,
    /// Ticket Engine step 10: commit on every successful turn with changes.
    pub auto_commit: bool,
    /// Template for the auto-commit message; `{ticket_id}` / `{title}` are
    /// substituted.
    pub auto_commit_template: String,
    /// Flow Store: synchronous vs batched commit.
    pub durable_writes: bool,
    /// Flow Reconciler scan interval while any run is `running`.
    pub reconciler_fast_interval_seconds: u64,
    /// Flow Reconciler scan interval when no run is `running`.
    pub reconciler_idle_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_total_turns: 200,
            max_lint_retries: 3,
            max_handles: 8,
            idle_ttl_seconds: 900,
            max_message_bytes: 50 * 1024 * 1024,
            restart_backoff_initial_seconds: 0.5,
            restart_backoff_max_seconds: 30.0,
            restart_backoff_jitter: 0.10,
            turn_stall_timeout_seconds: 300,
            min_recovery_interval_seconds: 5,
            auto_commit: true,
            auto_commit_template: "ticket-flow: {ticket_id} {title}".to_string(),
            durable_writes: true,
            reconciler_fast_interval_seconds: 1,
            reconciler_idle_interval_seconds: 15,
        }
    }
}

impl Config {
    /// Parse from the serialized form of `config.yml`'s in-scope subset.
    ///
    /// Callers outside the core own full YAML parsing; this accepts already
    /// decoded JSON so the core has no YAML dependency of its own.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, crate::error::CoreError> {
        serde_json::from_value(value)
            .map_err(|e| crate::error::CoreError::Config(format!("config.yml: {e}")))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
