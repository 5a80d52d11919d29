// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Flow Reconciler (spec §4.7): a hub-side watchdog that never mutates
//! flow *state*, only flow *status*. It only ever transitions a `running`
//! run to `stopped`, and only when it can conclusively prove the worker
//! that owns it is gone (spec §9 "Reconciler idempotence").
//!
//! This crate does not know how to check whether a worker pid is alive —
//! that lives one layer up, in `oj-daemon`, which owns the Worker Metadata
//! Registry and its `.worker` sidecar files. The [`WorkerChecker`] trait is
//! the injection seam (spec §9 "Break cycles by injection").

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use oj_core::{Clock, CoreResult, FlowEventType, FlowRunId, FlowStatus, RunPaths, WorkerCheck};
use oj_storage::{FlowStore, RunFilter, StatusUpdate};

/// Injected by `oj-daemon`: given the run's `.worker` sidecar directory,
/// report whether that worker is still alive (spec §4.7 step 2).
pub trait WorkerChecker: Send + Sync {
    fn check(&self, run_id: FlowRunId, run_dir: &Path) -> WorkerCheck;
}

/// Scans all non-terminal runs across repos sharing one [`FlowStore`] and
/// transitions orphaned `running` runs to `stopped` (spec §4.7).
pub struct Reconciler<C: Clock> {
    store: Arc<FlowStore>,
    checker: Arc<dyn WorkerChecker>,
    clock: C,
}

/// One scan's outcome, for the hub loop to log and for tests to assert on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    pub transitioned: Vec<FlowRunId>,
}

impl<C: Clock> Reconciler<C> {
    pub fn new(store: Arc<FlowStore>, checker: Arc<dyn WorkerChecker>, clock: C) -> Self {
        Self { store, checker, clock }
    }

    /// One scan (spec §4.7): lists every `running` run, checks its worker,
    /// and transitions the orphans. Runs that are `paused`, `completed`,
    /// `failed`, or `stopped` are never touched (spec §4.7 step 3).
    pub fn scan_once(&self) -> CoreResult<ScanReport> {
        let running = self.store.list_runs(RunFilter { flow_type: None, status: Some(FlowStatus::Running) })?;
        let mut report = ScanReport { scanned: running.len(), transitioned: Vec::new() };

        for run in running {
            let paths = RunPaths::from_input_data(&run.input_data);
            let run_dir = paths.run_dir(&run.id.to_string());
            let check = self.checker.check(run.id, &run_dir);

            if check.alive {
                continue;
            }

            let now = self.clock.epoch_ms();
            let update = StatusUpdate {
                current_step: Some(None),
                error_message: Some(Some("worker missing".to_string())),
                finished_at: Some(now),
                ..Default::default()
            };
            self.store.update_status_with_event(
                run.id,
                FlowStatus::Stopped,
                update,
                FlowEventType::FlowStopped,
                json!({"reason": "worker_missing", "detail": check.message}),
                now,
            )?;
            info!(run_id = %run.id, detail = %check.message, "reconciler stopped orphaned run");
            report.transitioned.push(run.id);
        }

        Ok(report)
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
