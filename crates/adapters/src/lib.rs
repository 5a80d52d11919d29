// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! oj-adapters: the Agent Backend Supervisor and Agent Pool (spec §4.2,
//! §4.3). Owns every JSON-RPC subprocess this worker talks to, restarts
//! them on disconnect, and exposes a single `run_turn` entry point to the
//! Ticket Engine.

mod approval;
mod backoff;
mod config;
mod error;
mod handle;
mod pool;
mod supervisor;

pub use approval::{ApprovalHandler, DefaultApprovalHandler, NoopNotificationHandler, NotificationHandler};
pub use config::AgentBackendConfig;
pub use error::{AdapterError, AdapterResult};
pub use handle::Handle;
pub use pool::AgentPool;
pub use supervisor::Supervisor;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
