// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Flow Controller (spec §4.6): a generic step-scheduler that advances
//! a [`FlowRun`] through a [`FlowDefinition`]'s named steps, persisting
//! every transition to the [`FlowStore`] before emitting the event that
//! announces it (spec §7 "Propagation": "The Store is updated before the
//! event is emitted").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

use oj_core::{
    Clock, CoreError, CoreResult, FlowEvent, FlowEventType, FlowRun, FlowRunId, FlowStatus,
    RunPaths, StepExecution, StepOutcome,
};
use oj_storage::{FlowStore, RunFilter, StatusUpdate};

use crate::fingerprint::repo_fingerprint;
use crate::outbox::load_unconsumed_replies;
use crate::state::{PauseReasonKind, TicketFlowState};

/// A named async step (spec §4.6: "an immutable `FlowDefinition{flow_type,
/// initial_step, steps: map[name → AsyncFn(record, input) → StepOutcome}`").
#[async_trait]
pub trait FlowStep: Send + Sync {
    async fn run(&self, run: &FlowRun) -> StepOutcome;
}

/// The step graph for one flow type. `ticket_flow` has exactly one step
/// that loops back to itself via `ContinueTo` (spec §4.5, §4.6).
pub struct FlowDefinition {
    pub flow_type: String,
    pub initial_step: String,
    pub steps: HashMap<String, Arc<dyn FlowStep>>,
}

impl FlowDefinition {
    pub fn ticket_flow(step: Arc<dyn FlowStep>) -> Self {
        let mut steps: HashMap<String, Arc<dyn FlowStep>> = HashMap::new();
        steps.insert(crate::ticket_engine::STEP_NAME.to_string(), step);
        Self {
            flow_type: "ticket_flow".to_string(),
            initial_step: crate::ticket_engine::STEP_NAME.to_string(),
            steps,
        }
    }
}

/// `RunFlow`/`ResumeFlow`/`StopFlow` (spec §4.6, §6 `FlowAPI`).
pub struct FlowController<C: Clock> {
    store: Arc<FlowStore>,
    definition: FlowDefinition,
    clock: C,
    events: broadcast::Sender<FlowEvent>,
}

impl<C: Clock> FlowController<C> {
    pub fn new(store: Arc<FlowStore>, definition: FlowDefinition, clock: C) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { store, definition, clock, events: tx }
    }

    /// `FlowAPI::SubscribeEvents(run_id) → stream<FlowEvent>` (spec §6).
    /// Events for every run flow through the same channel; callers filter
    /// by `run_id` themselves, matching a broadcast bus rather than a
    /// per-run subscription registry.
    pub fn subscribe_events(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<FlowStore> {
        &self.store
    }

    fn emit(
        &self,
        run_id: FlowRunId,
        event_type: FlowEventType,
        data: serde_json::Value,
        now_ms: u64,
    ) -> CoreResult<i64> {
        let seq = self.store.append_event(run_id, event_type.clone(), data.clone(), now_ms)?;
        let _ = self.events.send(FlowEvent { run_id, seq, event_type, ts: now_ms, data });
        Ok(seq)
    }

    fn emit_with_status(
        &self,
        run_id: FlowRunId,
        status: FlowStatus,
        update: StatusUpdate,
        event_type: FlowEventType,
        data: serde_json::Value,
        now_ms: u64,
    ) -> CoreResult<i64> {
        let seq = self
            .store
            .update_status_with_event(run_id, status, update, event_type.clone(), data.clone(), now_ms)?;
        let _ = self.events.send(FlowEvent { run_id, seq, event_type, ts: now_ms, data });
        Ok(seq)
    }

    /// `RunFlow(run_id)` (spec §4.6). Drives the run to a terminal status,
    /// a pause, or a cooperative stop, then returns the final [`FlowRun`].
    pub async fn run_flow(&self, run_id: FlowRunId) -> CoreResult<FlowRun> {
        let run = self.get_run(run_id)?;
        if run.status.is_terminal() {
            return Ok(run);
        }

        let now = self.clock.epoch_ms();
        let first_entry = run.started_at.is_none();
        let mut update = StatusUpdate::default();
        if first_entry {
            update.started_at = Some(now);
        }
        let started_event =
            if first_entry { FlowEventType::FlowStarted } else { FlowEventType::FlowResumed };
        self.emit_with_status(run_id, FlowStatus::Running, update, started_event, json!({}), now)?;

        loop {
            let run = self.get_run(run_id)?;

            if run.stop_requested {
                let now = self.clock.epoch_ms();
                let update = StatusUpdate {
                    current_step: Some(None),
                    finished_at: Some(now),
                    ..Default::default()
                };
                self.emit_with_status(run_id, FlowStatus::Stopped, update, FlowEventType::FlowStopped, json!({}), now)?;
                return self.get_run(run_id);
            }

            let step_name = run.current_step.clone().unwrap_or_else(|| self.definition.initial_step.clone());
            let step = self.definition.steps.get(&step_name).cloned().ok_or_else(|| {
                CoreError::internal(format!("flow {} has no step named {step_name}", run.id))
            })?;

            let attempt = self.store.next_step_attempt(run_id, &step_name)?;
            let started_at = self.clock.epoch_ms();
            self.emit(run_id, FlowEventType::StepStarted, json!({"step": step_name}), started_at)?;

            let outcome = run_step_catching_panics(step, run.clone()).await;
            let finished_at = self.clock.epoch_ms();

            self.store.record_step_execution(&StepExecution {
                run_id,
                step_name: step_name.clone(),
                attempt,
                status: outcome.status(),
                started_at,
                finished_at: Some(finished_at),
                error: step_error_message(&outcome),
            })?;

            info!(run_id = %run_id, step = %step_name, status = ?outcome.status(), "step finished");

            match self.apply_outcome(&run, &step_name, outcome, finished_at)? {
                Loop::Continue => continue,
                Loop::Return => return self.get_run(run_id),
            }
        }
    }

    fn apply_outcome(
        &self,
        run: &FlowRun,
        step_name: &str,
        outcome: StepOutcome,
        now: u64,
    ) -> CoreResult<Loop> {
        let run_id = run.id;
        match outcome {
            StepOutcome::Complete { output } => {
                let update = StatusUpdate {
                    state: Some(output),
                    current_step: Some(None),
                    finished_at: Some(now),
                    ..Default::default()
                };
                self.emit(run_id, FlowEventType::StepCompleted, json!({"step": step_name}), now)?;
                self.emit_with_status(run_id, FlowStatus::Completed, update, FlowEventType::FlowCompleted, json!({}), now)?;
                Ok(Loop::Return)
            }
            StepOutcome::Stop { output } => {
                let update = StatusUpdate {
                    state: Some(output),
                    current_step: Some(None),
                    finished_at: Some(now),
                    ..Default::default()
                };
                self.emit_with_status(run_id, FlowStatus::Stopped, update, FlowEventType::FlowStopped, json!({}), now)?;
                Ok(Loop::Return)
            }
            StepOutcome::Fail { error } => {
                let update = StatusUpdate {
                    current_step: Some(None),
                    error_message: Some(Some(error.clone())),
                    finished_at: Some(now),
                    ..Default::default()
                };
                self.emit(run_id, FlowEventType::StepFailed, json!({"step": step_name, "error": error}), now)?;
                self.emit_with_status(run_id, FlowStatus::Failed, update, FlowEventType::FlowFailed, json!({"error": error}), now)?;
                Ok(Loop::Return)
            }
            StepOutcome::Pause { output, reason } => {
                let update = StatusUpdate {
                    state: Some(output),
                    current_step: Some(Some(step_name.to_string())),
                    ..Default::default()
                };
                self.emit_with_status(
                    run_id,
                    FlowStatus::Paused,
                    update,
                    FlowEventType::FlowPaused,
                    json!({"reason": reason}),
                    now,
                )?;
                Ok(Loop::Return)
            }
            StepOutcome::ContinueTo { next, output } => {
                let next_step = next.iter().map(String::as_str).min().unwrap_or(step_name).to_string();
                let update = StatusUpdate {
                    state: Some(output),
                    current_step: Some(Some(next_step)),
                    ..Default::default()
                };
                self.emit_with_status(run_id, FlowStatus::Running, update, FlowEventType::StepCompleted, json!({"step": step_name}), now)?;
                Ok(Loop::Continue)
            }
        }
    }

    /// `ResumeFlow(run_id, force)` (spec §4.6). Callers still must call
    /// [`run_flow`](Self::run_flow) afterward to actually advance the run;
    /// this only flips the status and clears `stop_requested`.
    pub fn resume_flow(&self, run_id: FlowRunId, force: bool) -> CoreResult<FlowRun> {
        let run = self.get_run(run_id)?;
        if run.status.is_terminal() {
            return Err(CoreError::internal(format!("run {run_id} is terminal and cannot be resumed")));
        }
        if run.status == FlowStatus::Running {
            return Err(CoreError::internal(format!("run {run_id} is already running")));
        }

        if !force {
            self.check_resume_gate(&run)?;
        }

        self.store.set_stop_requested(run_id, false)?;
        let now = self.clock.epoch_ms();
        self.emit_with_status(run_id, FlowStatus::Running, StatusUpdate::default(), FlowEventType::FlowResumed, json!({"forced": force}), now)?;
        self.get_run(run_id)
    }

    /// The resume gate (spec §4.6, §8 property #6): only applies to
    /// `ticket_flow` pauses recorded with a `pause_context`. Any other
    /// pause (or the absence of a `pause_context`, e.g. an externally
    /// constructed run) is always resumable.
    fn check_resume_gate(&self, run: &FlowRun) -> CoreResult<()> {
        if run.flow_type != "ticket_flow" {
            return Ok(());
        }
        let state = TicketFlowState::from_value(&run.state);
        let Some(pause_ctx) = &state.pause_context else { return Ok(()) };
        if pause_ctx.reason_kind == PauseReasonKind::InfraError {
            return Ok(());
        }

        let paths = RunPaths::from_input_data(&run.input_data);
        let reply_paths = oj_core::resolve_reply_paths(&paths.workspace_root(), std::path::Path::new(&paths.runs_dir), &run.id.to_string());
        // A reply is "new" whether it has already been archived into
        // `reply_history/` (checked above the pause's recorded seq) or is
        // merely staged as `USER_REPLY.md` awaiting the next step's archival
        // — the engine only archives on its next turn, so the gate must see
        // the staged file too (spec §8 S2: an unforced resume succeeds as
        // soon as the human writes `USER_REPLY.md`, before any turn runs).
        let has_new_reply = reply_paths.reply_path.exists()
            || load_unconsumed_replies(&reply_paths, pause_ctx.paused_reply_seq)
                .map(|replies| !replies.is_empty())
                .unwrap_or(false);

        let current_fingerprint = repo_fingerprint(&paths.workspace_root()).unwrap_or_default();
        let fingerprint_changed = current_fingerprint != pause_ctx.repo_fingerprint;

        if has_new_reply || fingerprint_changed {
            return Ok(());
        }

        Err(CoreError::ResumeBlocked {
            reason: "no new reply and no repo change since the run paused; use force=true to override".to_string(),
        })
    }

    /// `StopFlow(run_id)` (spec §4.6): a soft, cooperative signal. Setting
    /// it on a terminal run is a silent no-op (spec §9 open question).
    pub fn stop_flow(&self, run_id: FlowRunId) -> CoreResult<()> {
        let run = self.get_run(run_id)?;
        if run.status.is_terminal() {
            return Ok(());
        }
        self.store.set_stop_requested(run_id, true)?;
        Ok(())
    }

    pub fn get_status(&self, run_id: FlowRunId) -> CoreResult<FlowRun> {
        self.get_run(run_id)
    }

    pub fn list_runs(&self, filter: RunFilter) -> CoreResult<Vec<FlowRun>> {
        Ok(self.store.list_runs(filter)?)
    }

    /// `FlowAPI::StartFlow`: creates the run row. Does not advance it —
    /// callers call [`run_flow`](Self::run_flow) next.
    pub fn start_flow(
        &self,
        id: FlowRunId,
        input_data: serde_json::Value,
        metadata: serde_json::Value,
    ) -> CoreResult<FlowRun> {
        let now = self.clock.epoch_ms();
        Ok(self.store.create_run(id, &self.definition.flow_type, input_data, metadata, now)?)
    }

    fn get_run(&self, run_id: FlowRunId) -> CoreResult<FlowRun> {
        self.store
            .get_run(run_id)?
            .ok_or_else(|| CoreError::internal(format!("run {run_id} not found")))
    }
}

enum Loop {
    Continue,
    Return,
}

fn step_error_message(outcome: &StepOutcome) -> Option<String> {
    match outcome {
        StepOutcome::Fail { error } => Some(error.clone()),
        StepOutcome::Pause { reason, .. } => reason.clone(),
        _ => None,
    }
}

/// Runs one step via `tokio::spawn` so a panic inside it is caught and
/// mapped to `StepOutcome::Fail` instead of taking the worker process down
/// with it (spec §9 "Exception-style control flow in the flow controller
/// ... any native panic from a step is caught and mapped to
/// `StepOutcome::Fail`").
async fn run_step_catching_panics(step: Arc<dyn FlowStep>, run: FlowRun) -> StepOutcome {
    match tokio::spawn(async move { step.run(&run).await }).await {
        Ok(outcome) => outcome,
        Err(join_err) => {
            warn!(error = %join_err, "flow step panicked");
            StepOutcome::Fail { error: format!("step panicked: {join_err}") }
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
