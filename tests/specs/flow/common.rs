//! Shared fixtures for the `ticket_flow` integration scenarios (spec.md
//! §8 S1-S6): a real temp workspace, real `TICKET-NNN.md` files, and a
//! real `fake-agent` subprocess driven through the real `Supervisor` /
//! `AgentPool` / `FlowController` stack — no mocks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use oj_adapters::{AgentBackendConfig, AgentPool, DefaultApprovalHandler, NoopNotificationHandler};
use oj_core::{AgentId, Config, FlowRunId, SystemClock};
use oj_engine::{FlowController, FlowDefinition, TicketEngineStep};
use oj_storage::FlowStore;

pub const AGENT_ID: &str = "fake";

pub struct Harness {
    pub workspace: PathBuf,
    pub controller: FlowController<SystemClock>,
    pub pool: Arc<AgentPool>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn input_data(&self) -> serde_json::Value {
        serde_json::json!({
            "workspace_root": self.workspace.to_string_lossy(),
            "runs_dir": ".codex-autorunner/runs",
        })
    }

    pub fn run_dir(&self, run_id: FlowRunId) -> PathBuf {
        self.workspace.join(".codex-autorunner/runs").join(run_id.to_string())
    }

    pub fn ticket_dir(&self) -> PathBuf {
        self.workspace.join(".codex-autorunner/tickets")
    }
}

pub fn fake_agent_bin() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_fake-agent")
        .or_else(|_| std::env::var("CARGO_BIN_EXE_fake_agent"))
        .map(PathBuf::from)
        .expect("fake-agent binary not built for this test run")
}

/// Builds a [`Harness`] with one registered backend (`AGENT_ID`) pointed at
/// `fake-agent`, configured via env vars the fixture reads at startup.
pub fn harness_with_agent_env(config: Config, env: HashMap<String, String>) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = dir.path().to_path_buf();
    std::fs::create_dir_all(workspace.join(".codex-autorunner/tickets")).unwrap();

    let store = Arc::new(FlowStore::open_in_memory().expect("open in-memory store"));
    let pool = Arc::new(AgentPool::new(
        workspace.clone(),
        config.clone(),
        Arc::new(DefaultApprovalHandler::default()),
        Arc::new(NoopNotificationHandler),
    ));
    let mut backend = AgentBackendConfig::new(fake_agent_bin().to_string_lossy().to_string());
    for (key, value) in env {
        backend = backend.env(key, value);
    }
    pool.register_backend(AgentId::new(AGENT_ID), backend);

    let step = Arc::new(TicketEngineStep::new(Arc::clone(&pool), config, SystemClock));
    let definition = FlowDefinition::ticket_flow(step);
    let controller = FlowController::new(store, definition, SystemClock);

    Harness { workspace, controller, pool, _dir: dir }
}

pub fn harness(config: Config) -> Harness {
    harness_with_agent_env(config, HashMap::new())
}

/// Writes `TICKET-<index:03>.md` with the given frontmatter (spec.md §3,
/// §6). `index` must be unique within the workspace's ticket directory.
pub fn write_ticket(workspace: &Path, index: u32, agent: &str, done: bool, title: &str, body: &str) -> PathBuf {
    let dir = workspace.join(".codex-autorunner/tickets");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("TICKET-{index:03}.md"));
    let contents = format!(
        "---\nagent: {agent}\ndone: {done}\ntitle: \"{title}\"\n---\n\n{body}\n",
    );
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn mark_ticket_done(path: &Path) {
    let raw = std::fs::read_to_string(path).unwrap();
    let updated = raw.replacen("done: false", "done: true", 1);
    std::fs::write(path, updated).unwrap();
}

/// Writes `USER_REPLY.md` into the run's staging directory (spec §3
/// "Reply").
pub fn write_reply(run_dir: &Path, body: &str) {
    std::fs::create_dir_all(run_dir).unwrap();
    std::fs::write(run_dir.join("USER_REPLY.md"), body).unwrap();
}
