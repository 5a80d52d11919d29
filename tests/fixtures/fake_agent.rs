// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fake agent backend subprocess for the integration scenarios under
//! `tests/specs/flow/` (spec.md §8 S1-S6). Speaks the same newline-delimited
//! JSON-RPC protocol a real backend would (`oj-wire`), so these tests
//! exercise the real `Supervisor`/`Handle` subprocess machinery rather than
//! stubbing it out. All behavior is read from environment variables so one
//! binary serves every scenario:
//!
//! - `FAKE_AGENT_TEXT`: the `item/completed` text for each turn.
//! - `FAKE_AGENT_WRITE_FILE` + `FAKE_AGENT_WRITE_CONTENTS`: if both are set,
//!   written to disk right before the first turn completes (stands in for
//!   the agent writing `DISPATCH.md`).
//! - `FAKE_AGENT_WRITE_FILE_2` + `FAKE_AGENT_WRITE_CONTENTS_2`: if both are
//!   set, written to disk right before the *second and later* turns
//!   complete instead of the `FAKE_AGENT_WRITE_FILE` pair. A single
//!   long-lived fake-agent process serves every turn of a run that never
//!   disconnects, so this is how one registered backend can behave
//!   differently before and after a pause for input is resumed.
//! - `FAKE_AGENT_DISCONNECT_AFTER_TURNS`: hang up with no response on the
//!   Nth `turn/start` and every one after, simulating a crash mid-turn.
//! - `FAKE_AGENT_ECHO_PROMPT`: when set, the `item/completed` text is the
//!   incoming `turn/start` request's first input item's text instead of
//!   `FAKE_AGENT_TEXT`, so a test can assert on what prompt the engine built.
//! - `FAKE_AGENT_RECORD_SANDBOX_POLICY`: path to write the incoming
//!   `turn/start` request's `sandboxPolicy` value to, as JSON.
//! - `FAKE_AGENT_CRASH_MARKER`: path to a marker file. The first process to
//!   run with this variable set creates the file and then disconnects with
//!   no response on its first `turn/start`, simulating a mid-turn crash; a
//!   respawned process finds the marker already present and behaves
//!   normally, so a test can assert a supervisor restart recovers exactly
//!   once.

use oj_wire::{method, read_message, write_message, Message, Notification, Response};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    let text = std::env::var("FAKE_AGENT_TEXT").unwrap_or_default();
    let write_file = std::env::var("FAKE_AGENT_WRITE_FILE").ok();
    let write_contents = std::env::var("FAKE_AGENT_WRITE_CONTENTS").unwrap_or_default();
    let write_file_2 = std::env::var("FAKE_AGENT_WRITE_FILE_2").ok();
    let write_contents_2 = std::env::var("FAKE_AGENT_WRITE_CONTENTS_2").unwrap_or_default();
    let disconnect_after: Option<u32> =
        std::env::var("FAKE_AGENT_DISCONNECT_AFTER_TURNS").ok().and_then(|s| s.parse().ok());
    let echo_prompt = std::env::var("FAKE_AGENT_ECHO_PROMPT").is_ok();
    let record_sandbox_policy = std::env::var("FAKE_AGENT_RECORD_SANDBOX_POLICY").ok();
    let crash_marker = std::env::var("FAKE_AGENT_CRASH_MARKER").ok();
    let crash_this_process = crash_marker.as_ref().is_some_and(|path| {
        let path = std::path::Path::new(path);
        if path.exists() {
            false
        } else {
            let _ = std::fs::write(path, b"crashed");
            true
        }
    });

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut turns = 0u32;

    loop {
        let msg = match read_message(&mut reader, 50 * 1024 * 1024).await {
            Ok(Some(m)) => m,
            _ => break,
        };
        let Message::Request(req) = msg else { continue };

        match req.method.as_str() {
            method::INITIALIZE => {
                let resp = Message::Response(Response::ok(req.id, serde_json::json!({"protocolVersion": 1})));
                if write_message(&mut stdout, &resp).await.is_err() {
                    break;
                }
            }
            method::THREAD_START | method::THREAD_RESUME => {
                let resp = Message::Response(Response::ok(req.id, serde_json::json!({"threadId": "fake-thread"})));
                if write_message(&mut stdout, &resp).await.is_err() {
                    break;
                }
            }
            method::TURN_START => {
                turns += 1;
                if disconnect_after.is_some_and(|n| turns > n) {
                    return;
                }
                if crash_this_process && turns == 1 {
                    return;
                }

                if let Some(path) = &record_sandbox_policy {
                    let policy = req.params.as_ref().and_then(|p| p.get("sandboxPolicy")).cloned();
                    let _ = std::fs::write(path, serde_json::to_string(&policy).unwrap_or_default());
                }

                let turn_id = format!("fake-turn-{turns}");
                let resp = Message::Response(Response::ok(req.id, serde_json::json!({"turnId": turn_id})));
                if write_message(&mut stdout, &resp).await.is_err() {
                    break;
                }

                if turns == 1 {
                    if let Some(path) = &write_file {
                        let _ = std::fs::write(path, &write_contents);
                    }
                } else if let Some(path) = &write_file_2 {
                    let _ = std::fs::write(path, &write_contents_2);
                }

                let item_text = if echo_prompt {
                    req.params
                        .as_ref()
                        .and_then(|p| p.get("input"))
                        .and_then(|i| i.get(0))
                        .and_then(|i| i.get("text"))
                        .and_then(|t| t.as_str())
                        .unwrap_or_default()
                        .to_string()
                } else {
                    text.clone()
                };

                let item = Message::Notification(Notification {
                    method: method::ITEM_COMPLETED.to_string(),
                    params: Some(serde_json::json!({"turnId": turn_id, "item": {"text": item_text}})),
                });
                let _ = write_message(&mut stdout, &item).await;

                let done = Message::Notification(Notification {
                    method: method::TURN_COMPLETED.to_string(),
                    params: Some(serde_json::json!({"turnId": turn_id, "status": "completed"})),
                });
                let _ = write_message(&mut stdout, &done).await;
            }
            _ => {}
        }
    }
}
