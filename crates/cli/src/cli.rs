// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument surface for `oj-worker` (spec §6 `FlowAPI`). Deliberately thin:
//! full CLI ergonomics (Telegram, PMA chat, templates, usage reports) are
//! out of scope (spec.md §1); this binary exists to preflight a
//! workspace's config and drive exactly one `ticket_flow` run.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oj-worker", version, about = "Per-repository ticket-flow worker")]
pub struct Cli {
    /// Repository root containing `.codex-autorunner/`.
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// `FlowAPI::StartFlow` + `RunFlow`: create a new `ticket_flow` run and
    /// drive it to completion, a pause, or a stop.
    Start,
    /// `FlowAPI::ResumeFlow` + `RunFlow` for an existing run.
    Resume {
        run_id: String,
        /// Bypass the resume gate (spec §4.6 `ResumeFlow(force=true)`).
        #[arg(long)]
        force: bool,
    },
    /// `FlowAPI::StopFlow`: request a cooperative stop.
    Stop { run_id: String },
    /// `FlowAPI::GetStatus`.
    Status { run_id: String },
    /// `FlowAPI::ListRuns`.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// One reconciler scan (spec §4.7), run out-of-band from any hub.
    Reconcile,
}
