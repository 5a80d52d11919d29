// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hub-side reconciler loop host (spec §4.7): wraps `oj-engine`'s pure
//! [`Reconciler`] with the concrete [`WorkerChecker`] this crate owns (the
//! `.worker` sidecar check) and a scan-interval policy — fast while any run
//! was found `running` last scan, slower otherwise (spec §4.7 "Periodically
//! (fast when any run is `running`, slower otherwise)").

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use oj_core::{Clock, Config, FlowRunId, WorkerCheck};
use oj_engine::{Reconciler, ScanReport, WorkerChecker};
use oj_storage::FlowStore;

use crate::registry::check_worker_dir;

/// [`WorkerChecker`] backed by the on-disk `.worker` sidecar (spec §4.7
/// step 2). Stateless; constructed fresh per [`ReconcilerHost`].
pub struct SidecarChecker;

impl WorkerChecker for SidecarChecker {
    fn check(&self, _run_id: FlowRunId, run_dir: &Path) -> WorkerCheck {
        check_worker_dir(run_dir)
    }
}

/// Runs [`Reconciler::scan_once`] on a loop until cancelled, varying the
/// interval per scan outcome rather than a fixed tick (spec §4.7).
pub struct ReconcilerHost<C: Clock> {
    reconciler: Reconciler<C>,
    fast_interval: Duration,
    idle_interval: Duration,
}

impl<C: Clock> ReconcilerHost<C> {
    pub fn new(store: Arc<FlowStore>, config: &Config, clock: C) -> Self {
        Self {
            reconciler: Reconciler::new(store, Arc::new(SidecarChecker), clock),
            fast_interval: Duration::from_secs(config.reconciler_fast_interval_seconds),
            idle_interval: Duration::from_secs(config.reconciler_idle_interval_seconds),
        }
    }

    /// One scan; exposed directly for tests and for the one-shot `reconcile`
    /// CLI invocation that doesn't want the loop.
    pub fn scan_once(&self) -> oj_core::CoreResult<ScanReport> {
        self.reconciler.scan_once()
    }

    /// Loops `scan_once` until `stop` resolves, sleeping `fast_interval`
    /// after a scan that found any `running` run, `idle_interval` otherwise
    /// (spec §4.7). Scan errors are logged and do not stop the loop — a
    /// transient store error should not itself orphan every run.
    pub async fn run_until(&self, mut stop: tokio::sync::oneshot::Receiver<()>) {
        loop {
            let interval = match self.reconciler.scan_once() {
                Ok(report) => {
                    tracing::info!(
                        scanned = report.scanned,
                        transitioned = report.transitioned.len(),
                        "reconciler scan"
                    );
                    if report.scanned > 0 { self.fast_interval } else { self.idle_interval }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reconciler scan failed");
                    self.idle_interval
                }
            };

            tokio::select! {
                _ = &mut stop => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_host_tests.rs"]
mod tests;
