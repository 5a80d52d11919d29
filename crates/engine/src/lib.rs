// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-engine: the Flow Engine and Ticket Flow (spec §4.5, §4.6, §4.7). Owns
//! the generic step-scheduler, the reconciler watchdog, and the one flow
//! this worker knows how to run today: `ticket_flow`.

mod controller;
mod error;
mod fingerprint;
mod frontmatter;
mod outbox;
mod prompt;
mod reconciler;
mod state;
mod ticket_engine;
mod ticket_files;
mod ticket_lint;

pub use controller::{FlowController, FlowDefinition, FlowStep};
pub use error::{EngineError, EngineResult};
pub use fingerprint::repo_fingerprint;
pub use outbox::{
    archive_dispatch, create_turn_summary, dispatch_reply, ensure_outbox_dirs, ensure_reply_dirs,
    load_unconsumed_replies,
};
pub use prompt::{build_prompt, pinned_docs, PromptContext, PREAMBLE};
pub use reconciler::{Reconciler, ScanReport, WorkerChecker};
pub use state::{CurrentTicket, LintState, PauseContext, PauseReasonKind, TicketFlowState};
pub use ticket_engine::{TicketEngineStep, STEP_NAME};
pub use ticket_files::{list_ticket_paths, lint_ticket_directory, read_ticket, ticket_is_done, TicketReadError};
pub use ticket_lint::{lint_dispatch_frontmatter, lint_ticket_frontmatter};
