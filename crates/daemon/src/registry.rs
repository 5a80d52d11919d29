// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Metadata Registry (spec §3 `WorkerMetadata`, §6
//! `WorkerRegistry`): the `.worker` sidecar under a run's directory,
//! written once on worker start and deleted on graceful shutdown. The
//! reconciler (`oj-engine::Reconciler`) treats its absence as
//! authoritative proof the run has no live owner (spec §5 "`.worker`
//! sidecar: written once on worker start, deleted on graceful shutdown;
//! reconciler treats absence as authoritative").

use std::path::{Path, PathBuf};

use oj_core::{FlowRunId, RunPaths, WorkerCheck, WorkerMetadata};

use crate::boot_id::current_boot_id;
use crate::pid::is_alive;

const SIDECAR_NAME: &str = ".worker";

/// Resolves `.worker` sidecar paths from `FlowRun.input_data` and performs
/// the register/clear/check lifecycle (spec §6 `WorkerRegistry`).
#[derive(Debug, Clone)]
pub struct WorkerRegistry {
    runs_dir: RunPaths,
}

impl WorkerRegistry {
    pub fn new(runs_dir: RunPaths) -> Self {
        Self { runs_dir }
    }

    fn sidecar_path(&self, run_id: FlowRunId) -> PathBuf {
        self.runs_dir.run_dir(&run_id.to_string()).join(SIDECAR_NAME)
    }

    /// `RegisterWorker(run_id, pid, boot_id)` (spec §6). Called once when a
    /// worker process picks up a run.
    pub fn register_worker(&self, run_id: FlowRunId, pid: u32, started_at: u64) -> std::io::Result<()> {
        let path = self.sidecar_path(run_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let metadata = WorkerMetadata::new(pid, current_boot_id(), started_at);
        let json = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| std::io::Error::other(format!("serializing worker metadata: {e}")))?;
        std::fs::write(&path, json)
    }

    /// `ClearWorker(run_id)` (spec §6). Called on graceful worker shutdown;
    /// a missing sidecar is not an error.
    pub fn clear_worker(&self, run_id: FlowRunId) -> std::io::Result<()> {
        match std::fs::remove_file(self.sidecar_path(run_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// `CheckWorker(run_id)` (spec §6): reads the sidecar and reports
    /// whether the pid it names is alive under the *current* boot id. A
    /// pid that is alive but under a stale boot id is reported dead — it
    /// is a reused pid from before a reboot, not the same process (spec
    /// §4.7 step 2).
    pub fn check_worker(&self, run_id: FlowRunId) -> WorkerCheck {
        check_sidecar(&self.sidecar_path(run_id))
    }
}

/// Free function variant used by [`crate::reconciler_host::RegistryChecker`],
/// which only has the run's directory (not a full registry) to work with.
pub fn check_worker_dir(run_dir: &Path) -> WorkerCheck {
    check_sidecar(&run_dir.join(SIDECAR_NAME))
}

fn check_sidecar(path: &Path) -> WorkerCheck {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(_) => {
            return WorkerCheck { alive: false, pid: None, message: "no .worker sidecar".to_string() }
        }
    };
    let metadata: WorkerMetadata = match serde_json::from_slice(&raw) {
        Ok(m) => m,
        Err(e) => {
            return WorkerCheck {
                alive: false,
                pid: None,
                message: format!(".worker sidecar unreadable: {e}"),
            }
        }
    };

    if metadata.boot_id != current_boot_id() {
        return WorkerCheck {
            alive: false,
            pid: Some(metadata.pid),
            message: format!("pid {} belongs to a prior boot ({})", metadata.pid, metadata.boot_id),
        };
    }

    if !is_alive(metadata.pid) {
        return WorkerCheck {
            alive: false,
            pid: Some(metadata.pid),
            message: format!("pid {} is not running", metadata.pid),
        };
    }

    WorkerCheck { alive: true, pid: Some(metadata.pid), message: "alive".to_string() }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
