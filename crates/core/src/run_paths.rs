// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The subset of `FlowRun.input_data` every flow type agrees on (spec §3:
//! "input_data (opaque JSON blob: `workspace_root`, `runs_dir`, etc.)").
//! The Ticket Engine, the Flow Controller's resume gate, and the Flow
//! Reconciler all need to turn a run into the two paths that matter —
//! the workspace root and the per-run runs directory — so this lives here
//! rather than being duplicated per crate.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunPaths {
    pub workspace_root: String,
    pub runs_dir: String,
}

impl Default for RunPaths {
    fn default() -> Self {
        Self {
            workspace_root: ".".to_string(),
            runs_dir: ".codex-autorunner/runs".to_string(),
        }
    }
}

impl RunPaths {
    /// Parses `FlowRun.input_data`; missing or mistyped keys fall back to
    /// the defaults rather than erroring, matching every other opaque-JSON
    /// boundary in this crate.
    pub fn from_input_data(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn workspace_root(&self) -> PathBuf {
        PathBuf::from(&self.workspace_root)
    }

    /// `<workspace_root>/<runs_dir>/<run_id>`.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.workspace_root().join(&self.runs_dir).join(run_id)
    }
}

#[cfg(test)]
#[path = "run_paths_tests.rs"]
mod tests;
