// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Stop`/`Status`/`List`/`Reconcile`: the `FlowAPI` calls that don't own
//! a run (spec §6) — they read or nudge state another worker owns.

use anyhow::{Context as _, Result};
use oj_core::{FlowRun, FlowRunId, FlowStatus, SystemClock};
use oj_daemon::ReconcilerHost;
use oj_engine::ScanReport;
use oj_storage::RunFilter;

use super::Context;

pub fn stop(ctx: &Context, run_id: &str) -> Result<()> {
    let run_id = FlowRunId::from_string(run_id).context("invalid run id")?;
    ctx.controller.stop_flow(run_id).context("StopFlow")
}

pub fn status(ctx: &Context, run_id: &str) -> Result<FlowRun> {
    let run_id = FlowRunId::from_string(run_id).context("invalid run id")?;
    ctx.controller.get_status(run_id).context("GetStatus")
}

pub fn list(ctx: &Context, status: Option<&str>) -> Result<Vec<FlowRun>> {
    let status = status.map(parse_status).transpose()?;
    ctx.controller
        .list_runs(RunFilter { flow_type: None, status })
        .context("ListRuns")
}

pub fn reconcile(ctx: &Context) -> Result<ScanReport> {
    let host = ReconcilerHost::new(ctx.controller.store().clone(), &ctx.config.engine, SystemClock);
    host.scan_once().context("reconciler scan")
}

fn parse_status(s: &str) -> Result<FlowStatus> {
    Ok(match s {
        "pending" => FlowStatus::Pending,
        "running" => FlowStatus::Running,
        "paused" => FlowStatus::Paused,
        "completed" => FlowStatus::Completed,
        "failed" => FlowStatus::Failed,
        "stopped" => FlowStatus::Stopped,
        other => anyhow::bail!("unknown status filter {other:?}"),
    })
}
