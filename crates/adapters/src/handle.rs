// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A live connection to one agent subprocess (spec §4.2 "Handle"): the
//! async reader loop, the writer mutex, the pending-request map, and the
//! per-turn-id state. Generic over `AsyncRead`/`AsyncWrite` so tests drive
//! it with an in-process duplex pipe instead of a real subprocess
//! (`SPEC_FULL.md` §1.4).

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex as StdMutex;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use oj_core::{AgentId, ApprovalDecision, ApprovalKind, ApprovalRequest, CoreError, TurnError, TurnResult};
use oj_wire::{method, read_message, write_message, Message, Notification, Request, Response};

use crate::approval::{ApprovalHandler, NotificationHandler};

struct TurnSlot {
    agent_messages: Vec<String>,
    raw_events: Vec<Value>,
    waiter: Option<oneshot::Sender<TurnResult>>,
    agent_id: AgentId,
    conversation_id: Option<String>,
}

/// One live subprocess connection. Dropping it does not terminate the
/// child; callers own that via [`Handle::shutdown`].
pub struct Handle {
    writer: Arc<TokioMutex<Pin<Box<dyn AsyncWrite + Send>>>>,
    next_id: AtomicI64,
    pending: Arc<StdMutex<HashMap<i64, oneshot::Sender<Response>>>>,
    turns: Arc<StdMutex<HashMap<String, TurnSlot>>>,
    approval_tx: mpsc::UnboundedSender<Request>,
    disconnected: Arc<AtomicBool>,
    reader_task: StdMutex<Option<JoinHandle<()>>>,
    approval_task: StdMutex<Option<JoinHandle<()>>>,
    child: StdMutex<Option<tokio::process::Child>>,
}

impl Handle {
    /// Wrap a subprocess's (or test fixture's) stdio into a live handle and
    /// spawn the reader + approval-dispatch tasks.
    pub fn spawn_io<R, W>(
        reader: R,
        writer: W,
        approval_handler: Arc<dyn ApprovalHandler>,
        notification_handler: Arc<dyn NotificationHandler>,
        max_message_bytes: usize,
        child: Option<tokio::process::Child>,
    ) -> Arc<Handle>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer: Arc<TokioMutex<Pin<Box<dyn AsyncWrite + Send>>>> =
            Arc::new(TokioMutex::new(Box::pin(writer)));
        let pending = Arc::new(StdMutex::new(HashMap::new()));
        let turns = Arc::new(StdMutex::new(HashMap::new()));
        let disconnected = Arc::new(AtomicBool::new(false));
        let (approval_tx, approval_rx) = mpsc::unbounded_channel::<Request>();

        let approval_task = tokio::spawn(approval_loop(
            approval_rx,
            approval_handler,
            Arc::clone(&writer),
        ));

        let reader_task = tokio::spawn(reader_loop(
            BufReader::new(reader),
            Arc::clone(&pending),
            Arc::clone(&turns),
            Arc::clone(&disconnected),
            approval_tx.clone(),
            notification_handler,
            max_message_bytes,
        ));

        Arc::new(Handle {
            writer,
            next_id: AtomicI64::new(1),
            pending,
            turns,
            approval_tx,
            disconnected,
            reader_task: StdMutex::new(Some(reader_task)),
            approval_task: StdMutex::new(Some(approval_task)),
            child: StdMutex::new(child),
        })
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Send a request and await its response. FIFO per-method ordering from
    /// the caller's perspective falls out of the writer mutex serializing
    /// sends and ids ordering responses (spec §5).
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CoreError> {
        if self.is_disconnected() {
            return Err(CoreError::BackendDisconnected {
                reason: "handle already disconnected".to_string(),
                preview: None,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let req = Message::Request(Request::new(id, method, params));
        {
            let mut w = self.writer.lock().await;
            write_message(&mut *w, &req).await.map_err(|e| {
                self.disconnected.store(true, Ordering::SeqCst);
                CoreError::BackendDisconnected { reason: e.to_string(), preview: None }
            })?;
        }

        let resp = rx.await.map_err(|_| CoreError::BackendDisconnected {
            reason: "connection closed while awaiting response".to_string(),
            preview: None,
        })?;
        match resp.error {
            Some(e) => Err(CoreError::BackendResponseError { code: e.code, message: e.message }),
            None => Ok(resp.result.unwrap_or(Value::Null)),
        }
    }

    pub async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<(), CoreError> {
        let note = Message::Notification(Notification { method: method.to_string(), params });
        let mut w = self.writer.lock().await;
        write_message(&mut *w, &note).await.map_err(|e| CoreError::BackendDisconnected {
            reason: e.to_string(),
            preview: None,
        })
    }

    /// Register a turn id so `item/completed`/`turn/completed` notifications
    /// can accumulate into it, and return a receiver resolved on
    /// `turn/completed` (or on disconnect).
    pub fn register_turn(&self, turn_id: String, agent_id: AgentId, conversation_id: Option<String>) -> oneshot::Receiver<TurnResult> {
        let (tx, rx) = oneshot::channel();
        self.turns.lock().insert(
            turn_id,
            TurnSlot { agent_messages: Vec::new(), raw_events: Vec::new(), waiter: Some(tx), agent_id, conversation_id },
        );
        rx
    }

    pub fn forget_turn(&self, turn_id: &str) {
        self.turns.lock().remove(turn_id);
    }

    /// `TurnInterrupt(turn_id)` (spec §4.2, §5 "cooperative; the supervisor
    /// forwards it and awaits `turn/completed`"). Forwards `turn/interrupt`
    /// to the subprocess, then resolves the registered waiter (if still
    /// pending) with an `interrupted` status rather than blocking the caller
    /// on the subprocess's own `turn/completed` notification.
    pub async fn interrupt_turn(&self, turn_id: &str) -> Result<(), CoreError> {
        let send_result = self
            .send_notification(method::TURN_INTERRUPT, Some(json!({ "turnId": turn_id })))
            .await;

        if let Some(mut slot) = self.turns.lock().remove(turn_id) {
            if let Some(waiter) = slot.waiter.take() {
                let _ = waiter.send(TurnResult {
                    text: slot.agent_messages.join("\n"),
                    agent_id: slot.agent_id.clone(),
                    conversation_id: slot.conversation_id.clone(),
                    turn_id: Some(turn_id.to_string()),
                    error: Some(TurnError {
                        kind: "interrupted".to_string(),
                        message: "turn interrupted".to_string(),
                    }),
                });
            }
        }

        send_result
    }

    /// Graceful shutdown: SIGTERM, 1s grace, SIGKILL (spec §4.2 `close()`).
    pub async fn shutdown(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        if let Some(task) = self.reader_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.approval_task.lock().take() {
            task.abort();
        }
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            if let Some(pid) = child.id() {
                #[cfg(unix)]
                {
                    let _ = nix::sys::signal::kill(
                        nix::unistd::Pid::from_raw(pid as i32),
                        nix::sys::signal::Signal::SIGTERM,
                    );
                }
            }
            let graceful = tokio::time::timeout(std::time::Duration::from_secs(1), child.wait()).await;
            if graceful.is_err() {
                let _ = child.kill().await;
            }
        }
    }
}

async fn approval_loop(
    mut rx: mpsc::UnboundedReceiver<Request>,
    handler: Arc<dyn ApprovalHandler>,
    writer: Arc<TokioMutex<Pin<Box<dyn AsyncWrite + Send>>>>,
) {
    // Single consumer processes one approval at a time, so responses are
    // sent in arrival order (spec §5 "Approvals are answered in arrival
    // order") without blocking the reader loop's other traffic.
    while let Some(req) = rx.recv().await {
        let kind = match req.method.as_str() {
            method::APPROVAL_COMMAND_EXECUTION => ApprovalKind::CommandExecution,
            method::APPROVAL_FILE_CHANGE => ApprovalKind::FileChange,
            _ => {
                warn!(method = %req.method, "unknown approval method");
                continue;
            }
        };
        let approval_req = ApprovalRequest {
            turn_id: req
                .params
                .as_ref()
                .and_then(|p| p.get("turnId"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            kind,
            params: req.params.clone().unwrap_or(Value::Null),
        };
        let decision = handler.decide(approval_req).await;
        let result = decision_to_result(decision);
        let resp = Message::Response(Response::ok(req.id, result));
        let mut w = writer.lock().await;
        if write_message(&mut *w, &resp).await.is_err() {
            break;
        }
    }
}

fn decision_to_result(decision: ApprovalDecision) -> Value {
    match decision {
        ApprovalDecision::Accept => serde_json::json!({"decision": "accept"}),
        ApprovalDecision::Decline => serde_json::json!({"decision": "decline"}),
        ApprovalDecision::Cancel => serde_json::json!({"decision": "cancel"}),
        ApprovalDecision::Override(v) => v,
    }
}

#[allow(clippy::too_many_arguments)]
async fn reader_loop<R>(
    mut reader: BufReader<R>,
    pending: Arc<StdMutex<HashMap<i64, oneshot::Sender<Response>>>>,
    turns: Arc<StdMutex<HashMap<String, TurnSlot>>>,
    disconnected: Arc<AtomicBool>,
    approval_tx: mpsc::UnboundedSender<Request>,
    notification_handler: Arc<dyn NotificationHandler>,
    max_message_bytes: usize,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    loop {
        let msg = read_message(&mut reader, max_message_bytes).await;
        match msg {
            Ok(Some(Message::Response(resp))) => {
                if let Some(tx) = pending.lock().remove(&resp.id) {
                    let _ = tx.send(resp);
                }
            }
            Ok(Some(Message::Notification(note))) => {
                trace!(method = %note.method, "notification");
                notification_handler.on_notification(&note.method, note.params.clone());
                handle_turn_notification(&turns, &note);
            }
            Ok(Some(Message::Request(req))) => {
                if approval_tx.send(req).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("subprocess stdout closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "wire framing error, disconnecting handle");
                break;
            }
        }
    }

    disconnected.store(true, Ordering::SeqCst);
    fail_all_pending(&pending);
    fail_all_turns(&turns);
}

fn handle_turn_notification(turns: &StdMutex<HashMap<String, TurnSlot>>, note: &Notification) {
    let Some(params) = &note.params else { return };
    let Some(turn_id) = params.get("turnId").and_then(|v| v.as_str()) else { return };

    match note.method.as_str() {
        method::ITEM_COMPLETED => {
            let mut guard = turns.lock();
            if let Some(slot) = guard.get_mut(turn_id) {
                if let Some(item) = params.get("item") {
                    slot.raw_events.push(item.clone());
                    if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
                        slot.agent_messages.push(text.to_string());
                    }
                }
            }
        }
        method::TURN_COMPLETED => {
            let mut guard = turns.lock();
            if let Some(mut slot) = guard.remove(turn_id) {
                let status = params.get("status").and_then(|v| v.as_str()).unwrap_or("completed");
                let result = TurnResult {
                    text: slot.agent_messages.join("\n"),
                    agent_id: slot.agent_id.clone(),
                    conversation_id: slot.conversation_id.take(),
                    turn_id: Some(turn_id.to_string()),
                    error: if status == "failed" {
                        Some(TurnError { kind: "backend_response_error".to_string(), message: format!("turn status: {status}") })
                    } else {
                        None
                    },
                };
                if let Some(waiter) = slot.waiter.take() {
                    let _ = waiter.send(result);
                }
            }
        }
        _ => {}
    }
}

fn fail_all_pending(pending: &StdMutex<HashMap<i64, oneshot::Sender<Response>>>) {
    let mut guard = pending.lock();
    for (id, tx) in guard.drain() {
        let _ = tx.send(Response::err(id, -32000, "backend disconnected"));
    }
}

fn fail_all_turns(turns: &StdMutex<HashMap<String, TurnSlot>>) {
    let mut guard = turns.lock();
    for (turn_id, mut slot) in guard.drain() {
        if let Some(waiter) = slot.waiter.take() {
            let _ = waiter.send(TurnResult {
                text: slot.agent_messages.join("\n"),
                agent_id: slot.agent_id.clone(),
                conversation_id: slot.conversation_id.clone(),
                turn_id: Some(turn_id),
                error: Some(TurnError {
                    kind: "backend_disconnected".to_string(),
                    message: "subprocess disconnected mid-turn".to_string(),
                }),
            });
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
