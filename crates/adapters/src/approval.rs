// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback seams injected into the Supervisor (spec §9 "Break cycles by
//! injection: the supervisor receives an `ApprovalHandler` callback and a
//! `NotificationHandler` callback; it does not know about the engine or the
//! pool").

use async_trait::async_trait;
use oj_core::{ApprovalDecision, ApprovalRequest};

/// Decides server-initiated approval requests
/// (`item/commandExecution/requestApproval`, `item/fileChange/requestApproval`).
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn decide(&self, request: ApprovalRequest) -> ApprovalDecision;
}

/// Receives every notification the supervisor observes, used by the UI's
/// event bus (spec §6 `NotificationHandler`). Out of scope concerns (the
/// event bus itself) consume this; the supervisor only calls it.
pub trait NotificationHandler: Send + Sync {
    fn on_notification(&self, method: &str, params: Option<serde_json::Value>);
}

/// The configured default when no handler is installed (spec §4.2: "If no
/// handler is configured, the supervisor returns the configured default
/// (typically `cancel`)").
pub struct DefaultApprovalHandler {
    pub default_decision: ApprovalDecision,
}

impl Default for DefaultApprovalHandler {
    fn default() -> Self {
        Self { default_decision: ApprovalDecision::default() }
    }
}

#[async_trait]
impl ApprovalHandler for DefaultApprovalHandler {
    async fn decide(&self, _request: ApprovalRequest) -> ApprovalDecision {
        self.default_decision.clone()
    }
}

/// Discards every notification. Useful when a caller only needs turn
/// results and doesn't drive a UI event bus.
pub struct NoopNotificationHandler;

impl NotificationHandler for NoopNotificationHandler {
    fn on_notification(&self, _method: &str, _params: Option<serde_json::Value>) {}
}
