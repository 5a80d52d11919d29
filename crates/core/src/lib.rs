// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-core: data model and error taxonomy for the per-repository
//! autonomous-coding flow engine. No I/O lives here — every type is a plain
//! value the storage, wire, adapters, and engine crates share at their
//! boundaries.

pub mod macros;

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod flow;
pub mod id;
pub mod outbox;
pub mod run_paths;
pub mod sandbox;
pub mod ticket;
pub mod turn;
pub mod worker_meta;

pub use agent::{AgentError, AgentId, AgentState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use flow::{
    FlowEvent, FlowEventType, FlowRun, FlowRunId, FlowStatus, StepExecution, StepOutcome,
    StepStatus,
};
#[cfg(any(test, feature = "test-support"))]
pub use flow::FlowRunBuilder;
pub use id::{short, IdBuf};
pub use outbox::{
    resolve_outbox_paths, resolve_reply_paths, seq_dir_name, Dispatch, DispatchMode,
    DispatchRecord, OutboxPaths, Reply, ReplyPaths, ReplyRecord,
};
pub use run_paths::RunPaths;
pub use sandbox::SandboxPolicy;
pub use ticket::{
    parse_ticket_filename, AgentRefKind, Ticket, TicketFrontmatter, TicketIndex,
    AGENT_SENTINEL_PAUSE, AGENT_SENTINEL_USER,
};
pub use turn::{
    AgentTurnRequest, ApprovalDecision, ApprovalKind, ApprovalPolicy, ApprovalRequest, TurnError,
    TurnInputItem, TurnResult,
};
pub use worker_meta::{WorkerCheck, WorkerMetadata};
