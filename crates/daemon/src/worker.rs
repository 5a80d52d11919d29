// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker process entry point (spec §2 "a worker process owns exactly
//! one Flow Controller", §5 "One worker process per active run", §6 exit
//! codes). `crates/cli` is the binary edge; this is the library logic it
//! calls, separated out so it can be driven from tests without a process
//! boundary.

use oj_core::{Clock, CoreResult, FlowRun, FlowRunId};
use oj_engine::FlowController;

use crate::registry::WorkerRegistry;

/// Drives one run to a terminal status, a pause, or a cooperative stop,
/// registering and clearing the `.worker` sidecar around the call so the
/// reconciler can tell this run has (or no longer has) a live owner
/// (spec §5 "Worker sidecar: written once on worker start, deleted on
/// graceful shutdown").
///
/// The sidecar is cleared on every exit path, including an `Err` return —
/// a worker that fails to advance the run at all is no longer its owner
/// either.
pub async fn run_one<C: Clock>(
    controller: &FlowController<C>,
    registry: &WorkerRegistry,
    run_id: FlowRunId,
    clock: &C,
) -> CoreResult<FlowRun> {
    registry.register_worker(run_id, std::process::id(), clock.epoch_ms())?;
    let result = controller.run_flow(run_id).await;
    // Best-effort: a failure to remove the sidecar is logged, not
    // propagated — the reconciler's pid+boot_id check would still
    // eventually prove this worker gone if cleanup fails here.
    if let Err(e) = registry.clear_worker(run_id) {
        tracing::warn!(run_id = %run_id, error = %e, "failed to clear worker sidecar");
    }
    result
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
