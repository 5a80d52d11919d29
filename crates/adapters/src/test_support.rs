// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake-handle test fixture (`SPEC_FULL.md` §1.4: "a fake agent
//! subprocess ... or an in-process `AsyncRead`/`AsyncWrite` pair"), reused by
//! this crate's own tests and exposed to downstream crates via the
//! `test-support` feature so the Ticket Engine's tests don't need a real
//! agent binary either.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{duplex, split, BufReader, DuplexStream};

use oj_wire::{method, read_message, write_message, Message, Notification, Response};

use crate::approval::{DefaultApprovalHandler, NoopNotificationHandler};
use crate::handle::Handle;

/// Canned behavior for the background responder started by
/// [`spawn_fake_handle`].
pub enum FakeTurnOutcome {
    /// Reply with this text on `turn/completed`.
    Text(String),
    /// Never send `turn/completed`, to exercise the stall-timeout path.
    Stall,
    /// Hang up right after acknowledging `turn/start`, to exercise
    /// mid-turn disconnect handling.
    Disconnect,
}

/// Spawns a [`Handle`] wired to an in-process duplex pipe, and a background
/// task that plays the other end of the JSON-RPC conversation: it answers
/// `initialize` and `thread/start`/`thread/resume` unconditionally, then
/// drives `turn/start` to `outcome`.
pub fn spawn_fake_handle(outcome: FakeTurnOutcome) -> Arc<Handle> {
    let (client_io, server_io) = duplex(64 * 1024);
    let (client_read, client_write) = split(client_io);

    let handle = Handle::spawn_io(
        client_read,
        client_write,
        Arc::new(DefaultApprovalHandler::default()),
        Arc::new(NoopNotificationHandler),
        50 * 1024 * 1024,
        None,
    );

    tokio::spawn(drive_fake_backend(server_io, outcome));
    handle
}

async fn drive_fake_backend(io: DuplexStream, outcome: FakeTurnOutcome) {
    let (read_half, write_half) = split(io);
    let mut reader = BufReader::new(read_half);
    let mut writer = write_half;

    loop {
        let msg = match read_message(&mut reader, 50 * 1024 * 1024).await {
            Ok(Some(m)) => m,
            _ => break,
        };
        let Message::Request(req) = msg else { continue };
        match req.method.as_str() {
            method::INITIALIZE => {
                let resp = Message::Response(Response::ok(req.id, json!({"protocolVersion": 1})));
                if write_message(&mut writer, &resp).await.is_err() {
                    break;
                }
            }
            method::THREAD_START | method::THREAD_RESUME => {
                let resp = Message::Response(Response::ok(req.id, json!({"threadId": "fake-thread"})));
                if write_message(&mut writer, &resp).await.is_err() {
                    break;
                }
            }
            method::TURN_START => {
                let turn_id = "fake-turn-1".to_string();
                let resp = Message::Response(Response::ok(req.id, json!({"turnId": turn_id})));
                if write_message(&mut writer, &resp).await.is_err() {
                    break;
                }

                match &outcome {
                    FakeTurnOutcome::Text(text) => {
                        let item = Message::Notification(Notification {
                            method: method::ITEM_COMPLETED.to_string(),
                            params: Some(json!({"turnId": turn_id, "item": {"text": text}})),
                        });
                        let _ = write_message(&mut writer, &item).await;
                        let done = Message::Notification(Notification {
                            method: method::TURN_COMPLETED.to_string(),
                            params: Some(json!({"turnId": turn_id, "status": "completed"})),
                        });
                        let _ = write_message(&mut writer, &done).await;
                    }
                    FakeTurnOutcome::Stall => {}
                    FakeTurnOutcome::Disconnect => break,
                }
            }
            _ => {}
        }
    }
}
