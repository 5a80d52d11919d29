// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Ticket Engine state machine (spec §4.5): exactly one agent turn
//! per call, producing a [`StepOutcome`] the Flow Controller persists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use oj_adapters::AgentPool;
use oj_core::outbox::{resolve_outbox_paths, resolve_reply_paths};
use oj_core::ticket::AgentRefKind;
use oj_core::{
    AgentId, AgentTurnRequest, Clock, Config, FlowRun, RunPaths, SandboxPolicy, StepOutcome,
    TurnInputItem,
};

use crate::controller::FlowStep;
use crate::fingerprint::repo_fingerprint;
use crate::outbox::{
    archive_dispatch, dispatch_reply, ensure_outbox_dirs, ensure_reply_dirs,
    load_unconsumed_replies,
};
use crate::prompt::{build_prompt, pinned_docs, PromptContext};
use crate::state::{CurrentTicket, PauseContext, PauseReasonKind, TicketFlowState};
use crate::ticket_files::{list_ticket_paths, read_ticket, TicketReadError};

/// Name of the (only) step in the `ticket_flow` [`FlowDefinition`]. The
/// step loops back to itself via `ContinueTo` until the flow completes,
/// pauses, or fails (spec §4.5, §4.6: "For ticket_flow there is exactly
/// one step").
pub const STEP_NAME: &str = "ticket_flow";

/// One step of `ticket_flow` (spec §4.5). Shared across every run of this
/// flow type; per-run paths are derived from `FlowRun.input_data` on each
/// call rather than fixed at construction.
pub struct TicketEngineStep<C: Clock> {
    pool: Arc<AgentPool>,
    config: Config,
    clock: C,
}

impl<C: Clock> TicketEngineStep<C> {
    pub fn new(pool: Arc<AgentPool>, config: Config, clock: C) -> Self {
        Self { pool, config, clock }
    }
}

#[async_trait]
impl<C: Clock> FlowStep for TicketEngineStep<C> {
    async fn run(&self, run: &FlowRun) -> StepOutcome {
        let input = RunPaths::from_input_data(&run.input_data);
        let workspace_root = input.workspace_root();
        let runs_dir = PathBuf::from(&input.runs_dir);
        let ticket_dir = workspace_root.join(".codex-autorunner").join("tickets");
        let contextspace_dir = workspace_root.join(".codex-autorunner").join("contextspace");

        let start = self.clock.now();
        let outcome = self
            .step(run, &workspace_root, &runs_dir, &ticket_dir, &contextspace_dir)
            .await;
        let elapsed_ms = self.clock.now().saturating_duration_since(start).as_millis();
        info!(run_id = %run.id, status = ?outcome.status(), elapsed_ms, "ticket_flow step finished");
        outcome
    }
}

impl<C: Clock> TicketEngineStep<C> {
    async fn step(
        &self,
        run: &FlowRun,
        workspace_root: &Path,
        runs_dir: &Path,
        ticket_dir: &Path,
        contextspace_dir: &Path,
    ) -> StepOutcome {
        let mut state = TicketFlowState::from_value(&run.state);
        let run_id = run.id.to_string();

        // Step 1: global budget.
        if state.total_turns >= self.config.max_total_turns {
            return pause(&mut state, "max turns".to_string(), PauseReasonKind::WaitForInput, workspace_root);
        }

        // Step 2: current-ticket resolution.
        let ticket_path = match self.resolve_current_ticket(&mut state, ticket_dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return StepOutcome::Complete { output: state.to_value() };
            }
            Err(e) => return StepOutcome::Fail { error: e.to_string() },
        };

        let (ticket, lint_errors) = match read_ticket(&ticket_path) {
            Ok(t) => (t, Vec::new()),
            Err(TicketReadError::Lint { errors, .. }) => {
                // Step 4: lint-retry mode — try to recover just the agent id.
                match relaxed_agent_id(&ticket_path) {
                    Some(agent_id) => (placeholder_ticket(&ticket_path, agent_id), errors),
                    None => {
                        return pause(
                            &mut state,
                            format!("ticket frontmatter invalid and unrecoverable: {}", errors.join("; ")),
                            PauseReasonKind::WaitForInput,
                            workspace_root,
                        );
                    }
                }
            }
            Err(TicketReadError::Io { source, .. }) => {
                return StepOutcome::Fail { error: source.to_string() };
            }
        };

        // Step 3: sentinel agents.
        let agent_ref = ticket.agent_ref();
        if agent_ref.is_sentinel() && !ticket.frontmatter.done {
            let reason = match agent_ref {
                AgentRefKind::Pause => "mark done to continue".to_string(),
                _ => "waiting on the user".to_string(),
            };
            return pause(&mut state, reason, PauseReasonKind::WaitForInput, workspace_root);
        }
        let AgentRefKind::Registered(agent_id) = agent_ref else {
            return pause(&mut state, "waiting on the user".to_string(), PauseReasonKind::WaitForInput, workspace_root);
        };

        // Step 5: prompt construction.
        let outbox_paths = resolve_outbox_paths(workspace_root, runs_dir, &run_id);
        let reply_paths = resolve_reply_paths(workspace_root, runs_dir, &run_id);
        if let Err(e) = ensure_outbox_dirs(&outbox_paths) {
            return StepOutcome::Fail { error: e.to_string() };
        }
        if let Err(e) = ensure_reply_dirs(&reply_paths) {
            return StepOutcome::Fail { error: e.to_string() };
        }

        // Archive any reply staged since the last step before reading
        // replies back, so a freshly written USER_REPLY.md is visible to
        // this same turn's prompt (spec §3 "Reply").
        if let Err(e) = dispatch_reply(&reply_paths, state.reply_seq + 1) {
            return StepOutcome::Fail { error: e.to_string() };
        }

        let replies = match load_unconsumed_replies(&reply_paths, state.reply_seq) {
            Ok(r) => r,
            Err(e) => return StepOutcome::Fail { error: e.to_string() },
        };
        let previous_output = if state.current_ticket.as_ref().map(|c| c.filename == ticket.filename).unwrap_or(false) {
            state.last_agent_output.as_deref()
        } else {
            None
        };
        let docs = pinned_docs(contextspace_dir);
        let prompt = build_prompt(&PromptContext {
            ticket: &ticket,
            lint_errors: &lint_errors,
            replies: &replies,
            previous_agent_output: previous_output,
            pinned_docs: &docs,
            workspace_root,
        });

        // Step 6: turn execution.
        state.total_turns += 1;
        state.ticket_turns += 1;
        let req = AgentTurnRequest {
            agent_id: agent_id.clone(),
            // Lint-retry mode reuses the prior conversation so the agent
            // keeps context while repairing frontmatter (spec §4.5 step 4).
            conversation_id: state.last_agent_conversation_id.clone(),
            input: vec![TurnInputItem::text(prompt)],
            approval_policy: "on-request".to_string(),
            sandbox_policy: SandboxPolicy::default(),
            cwd: workspace_root.to_path_buf(),
        };
        let turn_result = self.pool.run_turn(req).await;

        if !turn_result.is_success() {
            let message = turn_result.error.map(|e| e.message).unwrap_or_default();
            state.last_agent_output = Some(turn_result.text);
            state.last_agent_error = Some(message.clone());
            return pause(&mut state, message, PauseReasonKind::InfraError, workspace_root);
        }

        state.last_agent_output = Some(turn_result.text.clone());
        state.last_agent_id = Some(agent_id.to_string());
        state.last_agent_conversation_id = turn_result.conversation_id;
        state.last_agent_turn_id = turn_result.turn_id;
        state.last_agent_error = None;

        // Step 7: reply consumption — only on agent success.
        if let Some(max_seq) = replies.iter().map(|r| r.seq).max() {
            state.reply_seq = max_seq;
        }

        // Step 8: dispatch archival. Spec §4.5 step 8 calls only
        // `ArchiveDispatch`; a turn that leaves no `DISPATCH.md` staged
        // produces no dispatch at all (no synthetic summary, no
        // `outbox_seq` bump) — `CreateTurnSummary` remains a standalone
        // operation (spec §4.4) callers may invoke explicitly, but the
        // engine step never calls it on the agent's behalf.
        let next_outbox_seq = state.outbox_seq + 1;
        let dispatch_record = match archive_dispatch(&outbox_paths, next_outbox_seq) {
            Ok(Some(record)) => {
                state.outbox_seq = next_outbox_seq;
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                return pause(&mut state, e.to_string(), PauseReasonKind::WaitForInput, workspace_root);
            }
        };

        if let Some(record) = &dispatch_record {
            if record.dispatch.mode == oj_core::DispatchMode::Pause {
                let reason = record
                    .dispatch
                    .title
                    .clone()
                    .unwrap_or_else(|| "Paused for user input.".to_string());
                return pause(&mut state, reason, PauseReasonKind::WaitForInput, workspace_root);
            }
        }

        // Step 9: frontmatter re-lint.
        match read_ticket(&ticket_path) {
            Ok(reread) => {
                state.lint.retries = 0;
                state.lint.errors.clear();
                if reread.frontmatter.done {
                    state.current_ticket = None;
                    state.ticket_turns = 0;
                } else {
                    state.current_ticket =
                        Some(CurrentTicket { index: reread.index.0, filename: reread.filename.clone() });
                }
            }
            Err(TicketReadError::Lint { errors, .. }) => {
                state.lint.retries += 1;
                state.lint.errors = errors.clone();
                if state.lint.retries > self.config.max_lint_retries {
                    return pause(
                        &mut state,
                        format!("ticket frontmatter still invalid after {} retries: {}", state.lint.retries, errors.join("; ")),
                        PauseReasonKind::WaitForInput,
                        workspace_root,
                    );
                }
                return StepOutcome::ContinueTo { next: vec![STEP_NAME.to_string()], output: state.to_value() };
            }
            Err(TicketReadError::Io { source, .. }) => {
                return StepOutcome::Fail { error: source.to_string() };
            }
        }

        // Step 10: optional checkpoint.
        if self.config.auto_commit {
            if let Err(e) = maybe_commit(workspace_root, &self.config.auto_commit_template, &ticket) {
                warn!(run_id = %run.id, error = %e, "auto-commit failed; continuing");
                state.last_agent_error = Some(format!("auto-commit failed: {e}"));
            }
        }

        // Step 11: advance.
        StepOutcome::ContinueTo { next: vec![STEP_NAME.to_string()], output: state.to_value() }
    }

    fn resolve_current_ticket(
        &self,
        state: &mut TicketFlowState,
        ticket_dir: &Path,
    ) -> std::io::Result<Option<PathBuf>> {
        if let Some(current) = &state.current_ticket {
            let path = ticket_dir.join(&current.filename);
            if path.exists() && !crate::ticket_files::ticket_is_done(&path) {
                return Ok(Some(path));
            }
            state.current_ticket = None;
        }

        for (index, path) in list_ticket_paths(ticket_dir)? {
            if !crate::ticket_files::ticket_is_done(&path) {
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                state.current_ticket = Some(CurrentTicket { index: index.0, filename });
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

fn pause(
    state: &mut TicketFlowState,
    reason: String,
    reason_kind: PauseReasonKind,
    workspace_root: &Path,
) -> StepOutcome {
    let repo_fingerprint = repo_fingerprint(workspace_root).unwrap_or_default();
    state.pause_context = Some(PauseContext { paused_reply_seq: state.reply_seq, repo_fingerprint, reason_kind });
    StepOutcome::Pause { output: state.to_value(), reason: Some(reason) }
}

/// Relaxed parse used only in lint-retry mode (spec §4.5 step 4): extract
/// just the `agent` key so a repair turn can still run.
fn relaxed_agent_id(path: &Path) -> Option<AgentId> {
    let raw = std::fs::read_to_string(path).ok()?;
    let (value, _body) = crate::frontmatter::parse_markdown_frontmatter(&raw);
    value.get("agent").and_then(|v| v.as_str()).map(AgentId::new)
}

fn placeholder_ticket(path: &Path, agent_id: AgentId) -> oj_core::Ticket {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    let (index, _) = oj_core::parse_ticket_filename(&filename).unwrap_or((oj_core::TicketIndex(0), String::new()));
    oj_core::Ticket {
        index,
        filename,
        frontmatter: oj_core::TicketFrontmatter {
            agent: agent_id.to_string(),
            done: false,
            title: None,
            goal: None,
            model: None,
            reasoning: None,
            ticket_kind: None,
        },
        body: std::fs::read_to_string(path).unwrap_or_default(),
    }
}

fn maybe_commit(workspace_root: &Path, template: &str, ticket: &oj_core::Ticket) -> std::io::Result<()> {
    let status = std::process::Command::new("git")
        .arg("status")
        .arg("--porcelain")
        .current_dir(workspace_root)
        .output()?;
    if status.stdout.is_empty() {
        return Ok(());
    }

    let message = template
        .replace("{ticket_id}", &ticket.index.to_string())
        .replace("{title}", ticket.frontmatter.title.as_deref().unwrap_or(&ticket.filename));

    let add = std::process::Command::new("git").arg("add").arg("-A").current_dir(workspace_root).status()?;
    if !add.success() {
        return Err(std::io::Error::other("git add failed"));
    }
    let commit = std::process::Command::new("git")
        .arg("commit")
        .arg("-m")
        .arg(message)
        .current_dir(workspace_root)
        .status()?;
    if !commit.success() {
        return Err(std::io::Error::other("git commit failed"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "ticket_engine_tests.rs"]
mod tests;
