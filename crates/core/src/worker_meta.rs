// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker sidecar metadata (spec §3 `WorkerMetadata`, §4.7, §5).

use serde::{Deserialize, Serialize};

/// `<runs_dir>/<run_id>/.worker`. Written by the worker on startup, cleared
/// on graceful shutdown; the reconciler treats absence as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerMetadata {
    pub pid: u32,
    /// Distinguishes a live worker from a pid reused after reboot.
    pub boot_id: String,
    pub started_at: u64,
}

impl WorkerMetadata {
    pub fn new(pid: u32, boot_id: impl Into<String>, started_at: u64) -> Self {
        Self { pid, boot_id: boot_id.into(), started_at }
    }
}

/// Result of the reconciler's liveness check (spec §6 `CheckWorker`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCheck {
    pub alive: bool,
    pub pid: Option<u32>,
    pub message: String,
}

#[cfg(test)]
#[path = "worker_meta_tests.rs"]
mod tests;
