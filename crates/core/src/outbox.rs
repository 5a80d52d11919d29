// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch (agent→human) and Reply (human→agent) data model (spec §3,
//! §4.4). Filesystem archival itself lives in `oj-engine::outbox`; this
//! module only defines the parsed shapes both that module and the Ticket
//! Engine agree on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `DISPATCH.md` front-matter `mode` (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Notify,
    Pause,
    TurnSummary,
}

crate::simple_display! {
    DispatchMode {
        Notify => "notify",
        Pause => "pause",
        TurnSummary => "turn_summary",
    }
}

impl Default for DispatchMode {
    fn default() -> Self {
        Self::Notify
    }
}

/// A parsed `DISPATCH.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub mode: DispatchMode,
    pub body: String,
    pub title: Option<String>,
    /// Frontmatter keys other than `mode`/`title`, preserved verbatim.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An archived dispatch: `dispatch_history/<NNNN>/`.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub seq: u32,
    pub dispatch: Dispatch,
    pub archived_dir: PathBuf,
    pub archived_files: Vec<PathBuf>,
}

/// A parsed `USER_REPLY.md` (spec §3 "Reply").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub body: String,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An archived reply: `reply_history/<NNNN>/`.
#[derive(Debug, Clone)]
pub struct ReplyRecord {
    pub seq: u32,
    pub reply: Reply,
    pub archived_dir: PathBuf,
    pub archived_files: Vec<PathBuf>,
}

/// Canonical directory tuple for the outbox of one run (spec §4.4
/// `ResolveOutboxPaths`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxPaths {
    pub run_dir: PathBuf,
    pub dispatch_staging: PathBuf,
    pub dispatch_history_dir: PathBuf,
    pub dispatch_path: PathBuf,
}

/// Canonical directory tuple for the reply side (spec §4.4 "Reply side is
/// symmetric").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPaths {
    pub run_dir: PathBuf,
    pub reply_history_dir: PathBuf,
    pub reply_path: PathBuf,
}

pub fn resolve_outbox_paths(workspace_root: &std::path::Path, runs_dir: &std::path::Path, run_id: &str) -> OutboxPaths {
    let run_dir = workspace_root.join(runs_dir).join(run_id);
    OutboxPaths {
        dispatch_staging: run_dir.clone(),
        dispatch_history_dir: run_dir.join("dispatch_history"),
        dispatch_path: run_dir.join("DISPATCH.md"),
        run_dir,
    }
}

pub fn resolve_reply_paths(workspace_root: &std::path::Path, runs_dir: &std::path::Path, run_id: &str) -> ReplyPaths {
    let run_dir = workspace_root.join(runs_dir).join(run_id);
    ReplyPaths {
        reply_history_dir: run_dir.join("reply_history"),
        reply_path: run_dir.join("USER_REPLY.md"),
        run_dir,
    }
}

/// Format an archive subdirectory name: `<4-digit-seq>` (spec §3, §8 property #4).
pub fn seq_dir_name(seq: u32) -> String {
    format!("{seq:04}")
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
