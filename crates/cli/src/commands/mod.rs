// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod admin;
mod run;

pub use admin::{list, reconcile, status, stop};
pub use run::{resume, start};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use oj_adapters::{AgentPool, DefaultApprovalHandler, NoopNotificationHandler};
use oj_core::{CoreError, SystemClock};
use oj_daemon::WorkerRegistry;
use oj_engine::{FlowController, FlowDefinition, TicketEngineStep};
use oj_storage::FlowStore;

use crate::backends;
use crate::config::{self, FileConfig};

const STATE_DIR: &str = ".codex-autorunner";
const RUNS_DIR: &str = "runs";

/// Everything one `oj-worker` invocation needs, assembled once from the
/// workspace root and `config.yml` (spec §6 preflight).
pub struct Context {
    pub workspace: PathBuf,
    pub config: FileConfig,
    pub controller: FlowController<SystemClock>,
}

/// Runs preflight (spec §6: "0 ... 2 on preflight or configuration
/// error"): loads and validates `config.yml`, opens the Flow Store,
/// registers agent backends, and builds the one `ticket_flow`
/// [`FlowController`] this process drives.
pub fn build_context(workspace: &Path) -> Result<Context> {
    let workspace = workspace
        .canonicalize()
        .with_context(|| format!("workspace {} does not exist", workspace.display()))?;
    let state_dir = workspace.join(STATE_DIR);
    let config_path = state_dir.join("config.yml");
    let file_config = config::load(&config_path).map_err(config_error)?;

    let store = Arc::new(
        FlowStore::open(&state_dir.join("flows.db"), file_config.engine.durable_writes)
            .context("opening flow store")?,
    );

    let pool = Arc::new(AgentPool::new(
        workspace.clone(),
        file_config.engine.clone(),
        Arc::new(DefaultApprovalHandler::default()),
        Arc::new(NoopNotificationHandler),
    ));
    backends::register_all(&pool, &file_config);

    let step = Arc::new(TicketEngineStep::new(pool, file_config.engine.clone(), SystemClock));
    let definition = FlowDefinition::ticket_flow(step);
    let controller = FlowController::new(store, definition, SystemClock);

    Ok(Context { workspace, config: file_config, controller })
}

pub fn registry(ctx: &Context) -> WorkerRegistry {
    WorkerRegistry::new(oj_core::RunPaths {
        workspace_root: ctx.workspace.to_string_lossy().to_string(),
        runs_dir: RUNS_DIR.to_string(),
    })
}

pub fn input_data(ctx: &Context) -> serde_json::Value {
    serde_json::json!({
        "workspace_root": ctx.workspace.to_string_lossy(),
        "runs_dir": RUNS_DIR,
    })
}

/// A `ConfigError` is the one `CoreError` variant that maps to a distinct
/// exit code (spec §6: "2 on preflight or configuration error"); every
/// other `CoreError` surfaces as a generic failure (exit 1).
fn config_error(e: CoreError) -> anyhow::Error {
    anyhow::Error::new(e).context("invalid config.yml")
}
