// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the set of live [`Handle`]s for one `(workspace, backend)` pair
//! across its lifetime: spawning, the `initialize` handshake (with the
//! one-retry-without-version fallback), restart-on-disconnect, idle
//! pruning, and graceful shutdown (spec §4.2).

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::json;
use tokio::process::Command;
use tracing::{info, warn};

use oj_core::{AgentTurnRequest, Config, CoreError, TurnInputItem, TurnResult};
use oj_wire::method;

use crate::approval::{ApprovalHandler, NotificationHandler};
use crate::backoff::BackoffState;
use crate::config::AgentBackendConfig;
use crate::handle::Handle;

struct Live {
    handle: Arc<Handle>,
    last_used: Instant,
}

/// One subprocess-per-`(workspace, backend)` supervisor. Cheap to clone
/// (internally reference-counted); callers typically keep one per
/// registered backend id inside an [`crate::pool::AgentPool`].
pub struct Supervisor {
    backend: AgentBackendConfig,
    cwd: std::path::PathBuf,
    config: Config,
    approval_handler: Arc<dyn ApprovalHandler>,
    notification_handler: Arc<dyn NotificationHandler>,
    live: Mutex<Option<Live>>,
    backoff: Mutex<BackoffState>,
    last_recovery: Mutex<Option<Instant>>,
}

impl Supervisor {
    pub fn new(
        backend: AgentBackendConfig,
        cwd: std::path::PathBuf,
        config: Config,
        approval_handler: Arc<dyn ApprovalHandler>,
        notification_handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        Self {
            backend,
            cwd,
            config,
            approval_handler,
            notification_handler,
            live: Mutex::new(None),
            backoff: Mutex::new(BackoffState::new()),
            last_recovery: Mutex::new(None),
        }
    }

    /// Returns the live handle, spawning and initializing a fresh subprocess
    /// if none exists or the previous one disconnected.
    pub async fn ensure_handle(&self) -> Result<Arc<Handle>, CoreError> {
        {
            let mut guard = self.live.lock();
            if let Some(live) = guard.as_mut() {
                if !live.handle.is_disconnected() {
                    live.last_used = Instant::now();
                    return Ok(Arc::clone(&live.handle));
                }
                *guard = None;
            }
        }
        self.spawn_and_initialize().await
    }

    async fn spawn_and_initialize(&self) -> Result<Arc<Handle>, CoreError> {
        let delay = self.backoff.lock().next_delay(&self.config);
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        let mut cmd = Command::new(&self.backend.command);
        cmd.args(&self.backend.args)
            .current_dir(&self.cwd)
            .envs(&self.backend.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            self.backoff.lock().record_failure();
            CoreError::BackendUnavailable { reason: format!("spawn {}: {e}", self.backend.command) }
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            CoreError::BackendUnavailable { reason: "subprocess has no stdin".to_string() }
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            CoreError::BackendUnavailable { reason: "subprocess has no stdout".to_string() }
        })?;

        let handle = Handle::spawn_io(
            stdout,
            stdin,
            Arc::clone(&self.approval_handler),
            Arc::clone(&self.notification_handler),
            self.config.max_message_bytes,
            Some(child),
        );

        if let Err(e) = self.handshake(&handle).await {
            handle.shutdown().await;
            self.backoff.lock().record_failure();
            return Err(e);
        }

        self.backoff.lock().reset();
        *self.live.lock() = Some(Live { handle: Arc::clone(&handle), last_used: Instant::now() });
        Ok(handle)
    }

    /// `initialize` with the client's name/version; retried once without the
    /// version field if the backend rejects it (spec §4.2, §9 "retry once
    /// without the version field on `initialize` rejection").
    async fn handshake(&self, handle: &Arc<Handle>) -> Result<(), CoreError> {
        let with_version = json!({
            "clientName": self.backend.client_name,
            "clientVersion": self.backend.client_version,
        });
        match handle.call(method::INITIALIZE, Some(with_version)).await {
            Ok(_) => Ok(()),
            Err(first_err) => {
                warn!(error = %first_err, "initialize rejected, retrying without version");
                let without_version = json!({ "clientName": self.backend.client_name });
                handle.call(method::INITIALIZE, Some(without_version)).await.map(|_| ())
            }
        }
    }

    /// Runs one turn end to end, restarting the subprocess once if the
    /// initial handle is already disconnected, and enforcing the stall
    /// timeout (spec §4.3 steps 1-6).
    pub async fn run_turn(&self, req: AgentTurnRequest) -> TurnResult {
        match self.run_turn_inner(&req).await {
            Ok(result) => result,
            Err(e) => TurnResult {
                text: String::new(),
                agent_id: req.agent_id,
                conversation_id: req.conversation_id,
                turn_id: None,
                error: Some((&e).into()),
            },
        }
    }

    async fn run_turn_inner(&self, req: &AgentTurnRequest) -> Result<TurnResult, CoreError> {
        if let Some(last) = *self.last_recovery.lock() {
            let min_interval = Duration::from_secs(self.config.min_recovery_interval_seconds);
            if last.elapsed() < min_interval && self.live.lock().is_none() {
                return Err(CoreError::BackendUnavailable {
                    reason: "subprocess recovery throttled".to_string(),
                });
            }
        }

        let handle = self.ensure_handle().await?;

        let thread = if let Some(conversation_id) = &req.conversation_id {
            handle.call(method::THREAD_RESUME, Some(json!({ "threadId": conversation_id }))).await?
        } else {
            handle.call(method::THREAD_START, Some(json!({ "cwd": req.cwd }))).await?
        };
        let conversation_id = thread
            .get("threadId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| req.conversation_id.clone());

        let turn_started = handle
            .call(
                method::TURN_START,
                Some(json!({
                    "input": req.input.iter().map(turn_input_to_wire).collect::<Vec<_>>(),
                    "approvalPolicy": req.approval_policy,
                    "sandboxPolicy": req.sandbox_policy.to_wire_value(),
                    "cwd": req.cwd,
                })),
            )
            .await?;
        let turn_id = turn_started
            .get("turnId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::BackendResponseError {
                code: -32001,
                message: "turn/start response missing turnId".to_string(),
            })?
            .to_string();

        let waiter = handle.register_turn(turn_id.clone(), req.agent_id.clone(), conversation_id.clone());

        let stall_timeout = Duration::from_secs(self.config.turn_stall_timeout_seconds);
        match tokio::time::timeout(stall_timeout, waiter).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_canceled)) => Err(CoreError::BackendDisconnected {
                reason: "turn waiter dropped".to_string(),
                preview: None,
            }),
            Err(_elapsed) => {
                handle.forget_turn(&turn_id);
                *self.last_recovery.lock() = Some(Instant::now());
                Err(CoreError::TurnStalled { timeout_secs: self.config.turn_stall_timeout_seconds })
            }
        }
    }

    /// `TurnInterrupt(turn_id)` (spec §4.2 "Core operations"): forwards the
    /// cancel to the live handle, if any. A no-op (not an error) when no
    /// handle is live, since the turn has already ended one way or another.
    pub async fn interrupt_turn(&self, turn_id: &str) -> Result<(), CoreError> {
        let handle = self.live.lock().as_ref().map(|live| Arc::clone(&live.handle));
        match handle {
            Some(handle) => handle.interrupt_turn(turn_id).await,
            None => Ok(()),
        }
    }

    /// Close the live handle if it has been idle past `idle_ttl_seconds`
    /// (spec §4.2 "idle pruning").
    pub async fn prune_idle(&self) {
        let expired = {
            let guard = self.live.lock();
            guard
                .as_ref()
                .map(|live| live.last_used.elapsed() > Duration::from_secs(self.config.idle_ttl_seconds))
                .unwrap_or(false)
        };
        if expired {
            self.close().await;
        }
    }

    /// Graceful shutdown of the live handle, if any.
    pub async fn close(&self) {
        let live = self.live.lock().take();
        if let Some(live) = live {
            live.handle.shutdown().await;
            info!("agent subprocess closed");
        }
    }

    pub fn has_live_handle(&self) -> bool {
        self.live.lock().as_ref().map(|l| !l.handle.is_disconnected()).unwrap_or(false)
    }
}

fn turn_input_to_wire(item: &TurnInputItem) -> serde_json::Value {
    json!({ "type": item.kind, "text": item.text })
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
