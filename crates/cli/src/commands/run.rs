// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Start`/`Resume`: the two subcommands that actually drive a
//! `ticket_flow` run, registering the `.worker` sidecar around the call
//! (spec §5 "one worker process per active flow run").

use anyhow::{Context as _, Result};
use oj_core::{FlowRunId, SystemClock};

use super::Context;

pub async fn start(ctx: &Context) -> Result<oj_core::FlowRun> {
    let run = ctx
        .controller
        .start_flow(FlowRunId::new(), super::input_data(ctx), serde_json::json!({}))
        .context("StartFlow")?;
    drive(ctx, run.id).await
}

pub async fn resume(ctx: &Context, run_id: &str, force: bool) -> Result<oj_core::FlowRun> {
    let run_id = FlowRunId::from_string(run_id).context("invalid run id")?;
    ctx.controller.resume_flow(run_id, force).context("ResumeFlow")?;
    drive(ctx, run_id).await
}

async fn drive(ctx: &Context, run_id: FlowRunId) -> Result<oj_core::FlowRun> {
    let registry = super::registry(ctx);
    oj_daemon::run_one(&ctx.controller, &registry, run_id, &SystemClock)
        .await
        .context("RunFlow")
}
