// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin facade the Ticket Engine drives (spec §4.3): selects the
//! [`Supervisor`] registered for an agent id and runs one turn through it.
//! The pool owns no JSON-RPC or process-lifecycle knowledge itself — that
//! lives in [`crate::supervisor::Supervisor`] and [`crate::handle::Handle`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use oj_core::{AgentId, AgentTurnRequest, Config, CoreError, TurnResult};

use crate::approval::{ApprovalHandler, NotificationHandler};
use crate::config::AgentBackendConfig;
use crate::supervisor::Supervisor;

/// Registry of agent backends and their live supervisors for one worker
/// process (spec §4.1 "one worker process per active flow run").
pub struct AgentPool {
    cwd: PathBuf,
    config: Config,
    approval_handler: Arc<dyn ApprovalHandler>,
    notification_handler: Arc<dyn NotificationHandler>,
    backends: RwLock<HashMap<AgentId, AgentBackendConfig>>,
    supervisors: RwLock<HashMap<AgentId, Arc<Supervisor>>>,
}

impl AgentPool {
    pub fn new(
        cwd: PathBuf,
        config: Config,
        approval_handler: Arc<dyn ApprovalHandler>,
        notification_handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        Self {
            cwd,
            config,
            approval_handler,
            notification_handler,
            backends: RwLock::new(HashMap::new()),
            supervisors: RwLock::new(HashMap::new()),
        }
    }

    /// Declares how to spawn the subprocess backing `agent_id`. Idempotent;
    /// re-registering replaces the config for the *next* spawn but does not
    /// disturb an already-live handle.
    pub fn register_backend(&self, agent_id: AgentId, backend: AgentBackendConfig) {
        self.backends.write().insert(agent_id, backend);
    }

    fn supervisor_for(&self, agent_id: &AgentId) -> Result<Arc<Supervisor>, CoreError> {
        if let Some(sup) = self.supervisors.read().get(agent_id) {
            return Ok(Arc::clone(sup));
        }
        let mut supervisors = self.supervisors.write();
        if let Some(sup) = supervisors.get(agent_id) {
            return Ok(Arc::clone(sup));
        }
        let backend = self
            .backends
            .read()
            .get(agent_id)
            .cloned()
            .ok_or_else(|| CoreError::BackendUnavailable {
                reason: format!("no backend registered for agent {agent_id}"),
            })?;
        let sup = Arc::new(Supervisor::new(
            backend,
            self.cwd.clone(),
            self.config.clone(),
            Arc::clone(&self.approval_handler),
            Arc::clone(&self.notification_handler),
        ));
        supervisors.insert(agent_id.clone(), Arc::clone(&sup));
        Ok(sup)
    }

    /// Run one turn to completion (spec §4.3's 6-step algorithm): resolve
    /// the supervisor, ensure a live handle, start or resume the backend
    /// thread, start the turn, and await completion or the stall timeout.
    /// Every failure mode is coerced into a [`TurnResult`] with `error` set
    /// rather than propagated, so the Ticket Engine always has a uniform
    /// result to persist.
    pub async fn run_turn(&self, req: AgentTurnRequest) -> TurnResult {
        let agent_id = req.agent_id.clone();
        let conversation_id = req.conversation_id.clone();
        match self.supervisor_for(&agent_id) {
            Ok(sup) => sup.run_turn(req).await,
            Err(e) => TurnResult {
                text: String::new(),
                agent_id,
                conversation_id,
                turn_id: None,
                error: Some((&e).into()),
            },
        }
    }

    /// `TurnInterrupt(turn_id)` (spec §4.2, §4.3): forwards the cancel to
    /// `agent_id`'s supervisor. No-op if the agent has no live supervisor.
    pub async fn interrupt_turn(&self, agent_id: &AgentId, turn_id: &str) -> Result<(), CoreError> {
        match self.supervisor_for(agent_id) {
            Ok(sup) => sup.interrupt_turn(turn_id).await,
            Err(_) => Ok(()),
        }
    }

    /// Prunes idle handles across every registered supervisor (spec §4.2
    /// idle pruning), intended to be called on a timer by the worker host.
    pub async fn prune_idle(&self) {
        let supervisors: Vec<_> = self.supervisors.read().values().cloned().collect();
        for sup in supervisors {
            sup.prune_idle().await;
        }
    }

    /// Gracefully closes every live handle. Called on worker shutdown.
    pub async fn close_all(&self) {
        let supervisors: Vec<_> = self.supervisors.read().values().cloned().collect();
        for sup in supervisors {
            sup.close().await;
        }
    }

    pub fn has_live_handle(&self, agent_id: &AgentId) -> bool {
        self.supervisors
            .read()
            .get(agent_id)
            .map(|s| s.has_live_handle())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
