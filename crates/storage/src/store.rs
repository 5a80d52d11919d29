// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Flow Store (spec §4.1): a single durable SQLite file per repo,
//! single-writer, every write wrapped in a transaction. Readers (the UI, the
//! reconciler) may open their own connections concurrently; this struct is
//! the writer's handle and serializes writes itself via `parking_lot::Mutex`
//! so a worker process never needs to reason about SQLite's own locking.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use oj_core::{FlowEvent, FlowEventType, FlowRun, FlowRunId, FlowStatus, StepExecution, StepStatus};

use crate::error::{StorageError, StorageResult};
use crate::lock::FlowStoreLock;
use crate::migrations;

/// Filter for [`FlowStore::list_runs`] (spec §4.1 `ListRuns`).
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub flow_type: Option<String>,
    pub status: Option<FlowStatus>,
}

/// Fields an [`FlowStore::update_status`] call may change. `None` means
/// "leave unchanged"; the explicit `Option<Option<T>>` fields distinguish
/// "leave unchanged" from "clear to null".
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub state: Option<serde_json::Value>,
    pub current_step: Option<Option<String>>,
    pub error_message: Option<Option<String>>,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

pub struct FlowStore {
    conn: Mutex<Connection>,
    _lock: FlowStoreLock,
}

impl FlowStore {
    /// Open (creating if absent) the SQLite file at `path`, acquiring the
    /// sibling advisory lock first (spec §9, `SPEC_FULL.md` §2).
    /// `durable_writes` selects `PRAGMA synchronous=FULL` (crash-safe on
    /// every commit) vs `NORMAL` (faster, WAL-buffered).
    pub fn open(path: &Path, durable_writes: bool) -> StorageResult<Self> {
        let lock = FlowStoreLock::acquire(path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", if durable_writes { "FULL" } else { "NORMAL" })?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        info!(path = %path.display(), durable_writes, "flow store opened");
        Ok(Self { conn: Mutex::new(conn), _lock: lock })
    }

    /// In-memory store for tests; skips the lock file entirely.
    #[cfg(any(test, feature = "test-support"))]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        let lock_path = std::env::temp_dir().join(format!("oj-test-lock-{}", uuid_like()));
        Ok(Self { conn: Mutex::new(conn), _lock: FlowStoreLock::acquire(&lock_path)? })
    }

    /// CreateRun (spec §4.1): rejects a duplicate id.
    pub fn create_run(
        &self,
        id: FlowRunId,
        flow_type: &str,
        input_data: serde_json::Value,
        metadata: serde_json::Value,
        now_ms: u64,
    ) -> StorageResult<FlowRun> {
        let run = FlowRun {
            id,
            flow_type: flow_type.to_string(),
            status: FlowStatus::Pending,
            current_step: None,
            input_data,
            state: serde_json::json!({}),
            metadata,
            error_message: None,
            created_at: now_ms,
            started_at: None,
            finished_at: None,
            stop_requested: false,
        };
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO flow_run (id, flow_type, status, current_step, input_data, state, \
             metadata, error_message, created_at, started_at, finished_at, stop_requested) \
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, NULL, ?7, NULL, NULL, 0)",
            params![
                run.id.to_string(),
                run.flow_type,
                run.status.to_string(),
                run.input_data.to_string(),
                run.state.to_string(),
                run.metadata.to_string(),
                now_ms as i64,
            ],
        );
        match result {
            Ok(_) => {
                debug!(run_id = %run.id, flow_type, "run created");
                Ok(run)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateRun(run.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_run(&self, id: FlowRunId) -> StorageResult<Option<FlowRun>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, flow_type, status, current_step, input_data, state, metadata, \
             error_message, created_at, started_at, finished_at, stop_requested \
             FROM flow_run WHERE id = ?1",
            params![id.to_string()],
            row_to_run,
        )
        .optional()
        .map_err(StorageError::from)
    }

    pub fn list_runs(&self, filter: RunFilter) -> StorageResult<Vec<FlowRun>> {
        let conn = self.conn.lock();
        let base = "SELECT id, flow_type, status, current_step, input_data, state, metadata, \
             error_message, created_at, started_at, finished_at, stop_requested FROM flow_run";
        let status_str = filter.status.map(|s| s.to_string());

        let rows: Vec<FlowRun> = match (&filter.flow_type, &status_str) {
            (Some(ft), Some(st)) => {
                let mut stmt = conn.prepare(&format!("{base} WHERE flow_type = ?1 AND status = ?2 ORDER BY created_at DESC"))?;
                stmt.query_map(params![ft, st], row_to_run)?.collect::<Result<_, _>>()?
            }
            (Some(ft), None) => {
                let mut stmt = conn.prepare(&format!("{base} WHERE flow_type = ?1 ORDER BY created_at DESC"))?;
                stmt.query_map(params![ft], row_to_run)?.collect::<Result<_, _>>()?
            }
            (None, Some(st)) => {
                let mut stmt = conn.prepare(&format!("{base} WHERE status = ?1 ORDER BY created_at DESC"))?;
                stmt.query_map(params![st], row_to_run)?.collect::<Result<_, _>>()?
            }
            (None, None) => {
                let mut stmt = conn.prepare(&format!("{base} ORDER BY created_at DESC"))?;
                stmt.query_map([], row_to_run)?.collect::<Result<_, _>>()?
            }
        };
        Ok(rows)
    }

    /// SetStopRequested (spec §4.1). A silent no-op on a terminal run
    /// (spec §9 open question).
    pub fn set_stop_requested(&self, id: FlowRunId, stop: bool) -> StorageResult<()> {
        let conn = self.conn.lock();
        let n = conn.execute(
            "UPDATE flow_run SET stop_requested = ?1 WHERE id = ?2",
            params![stop as i64, id.to_string()],
        )?;
        if n == 0 {
            return Err(StorageError::RunNotFound(id.to_string()));
        }
        Ok(())
    }

    /// UpdateStatus (spec §4.1): atomic row update. Terminal → anything is
    /// rejected; all other transitions are allowed.
    pub fn update_status(
        &self,
        id: FlowRunId,
        status: FlowStatus,
        update: StatusUpdate,
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        apply_status_update(&tx, id, status, &update)?;
        tx.commit()?;
        Ok(())
    }

    /// AppendEvent (spec §4.1): assigns the next seq under its own
    /// transaction.
    pub fn append_event(
        &self,
        run_id: FlowRunId,
        event_type: FlowEventType,
        data: serde_json::Value,
        now_ms: u64,
    ) -> StorageResult<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let seq = insert_event(&tx, run_id, &event_type, &data, now_ms)?;
        tx.commit()?;
        Ok(seq)
    }

    /// Combined status change + event append in one transaction, so a
    /// reader that reads status then reads events never observes events
    /// ahead of status (spec §7 "Propagation").
    pub fn update_status_with_event(
        &self,
        id: FlowRunId,
        status: FlowStatus,
        update: StatusUpdate,
        event_type: FlowEventType,
        event_data: serde_json::Value,
        now_ms: u64,
    ) -> StorageResult<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        apply_status_update(&tx, id, status, &update)?;
        let seq = insert_event(&tx, id, &event_type, &event_data, now_ms)?;
        tx.commit()?;
        Ok(seq)
    }

    pub fn list_events(&self, run_id: FlowRunId) -> StorageResult<Vec<FlowEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT run_id, seq, event_type, ts, data FROM flow_event \
             WHERE run_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![run_id.to_string()], row_to_event)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    /// Next attempt number for `(run_id, step_name)` (spec §3 `StepExecution`
    /// "one row per `(run_id, step_name, attempt)`"), so the Flow Controller
    /// never has to track attempt counters itself across a worker restart.
    pub fn next_step_attempt(&self, run_id: FlowRunId, step_name: &str) -> StorageResult<u32> {
        let conn = self.conn.lock();
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(attempt), 0) + 1 FROM step_execution \
             WHERE run_id = ?1 AND step_name = ?2",
            params![run_id.to_string(), step_name],
            |r| r.get(0),
        )?;
        Ok(next as u32)
    }

    pub fn record_step_execution(&self, step: &StepExecution) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO step_execution (run_id, step_name, attempt, status, started_at, \
             finished_at, error) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (run_id, step_name, attempt) DO UPDATE SET \
             status = excluded.status, finished_at = excluded.finished_at, error = excluded.error",
            params![
                step.run_id.to_string(),
                step.step_name,
                step.attempt,
                step.status.to_string(),
                step.started_at as i64,
                step.finished_at.map(|v| v as i64),
                step.error,
            ],
        )?;
        Ok(())
    }
}

fn apply_status_update(
    tx: &rusqlite::Transaction<'_>,
    id: FlowRunId,
    status: FlowStatus,
    update: &StatusUpdate,
) -> StorageResult<()> {
    let current_status: Option<String> = tx
        .query_row("SELECT status FROM flow_run WHERE id = ?1", params![id.to_string()], |r| {
            r.get(0)
        })
        .optional()?;
    let current_status = current_status.ok_or_else(|| StorageError::RunNotFound(id.to_string()))?;
    let was_terminal = matches!(current_status.as_str(), "completed" | "failed" | "stopped");
    if was_terminal {
        return Err(StorageError::TerminalTransition { run_id: id.to_string(), status: current_status });
    }

    let finished_at = update.finished_at.map(|v| v as i64);
    tx.execute(
        "UPDATE flow_run SET status = ?1, \
         state = COALESCE(?2, state), \
         current_step = CASE WHEN ?3 THEN ?4 ELSE current_step END, \
         error_message = CASE WHEN ?5 THEN ?6 ELSE error_message END, \
         started_at = COALESCE(?7, started_at), \
         finished_at = COALESCE(?8, finished_at) \
         WHERE id = ?9",
        params![
            status.to_string(),
            update.state.as_ref().map(|v| v.to_string()),
            update.current_step.is_some(),
            update.current_step.clone().flatten(),
            update.error_message.is_some(),
            update.error_message.clone().flatten(),
            update.started_at.map(|v| v as i64),
            finished_at,
            id.to_string(),
        ],
    )?;
    Ok(())
}

fn insert_event(
    tx: &rusqlite::Transaction<'_>,
    run_id: FlowRunId,
    event_type: &FlowEventType,
    data: &serde_json::Value,
    now_ms: u64,
) -> StorageResult<i64> {
    let next_seq: i64 = tx.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM flow_event WHERE run_id = ?1",
        params![run_id.to_string()],
        |r| r.get(0),
    )?;
    tx.execute(
        "INSERT INTO flow_event (run_id, seq, event_type, ts, data) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![run_id.to_string(), next_seq, event_type.to_string(), now_ms as i64, data.to_string()],
    )?;
    Ok(next_seq)
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlowRun> {
    let id_str: String = row.get(0)?;
    let status_str: String = row.get(2)?;
    let input_str: String = row.get(4)?;
    let state_str: String = row.get(5)?;
    let metadata_str: String = row.get(6)?;
    Ok(FlowRun {
        id: FlowRunId::from_string(&id_str)
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?,
        flow_type: row.get(1)?,
        status: parse_flow_status(&status_str),
        current_step: row.get(3)?,
        input_data: serde_json::from_str(&input_str).unwrap_or(serde_json::Value::Null),
        state: serde_json::from_str(&state_str).unwrap_or(serde_json::Value::Null),
        metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
        error_message: row.get(7)?,
        created_at: row.get::<_, i64>(8)? as u64,
        started_at: row.get::<_, Option<i64>>(9)?.map(|v| v as u64),
        finished_at: row.get::<_, Option<i64>>(10)?.map(|v| v as u64),
        stop_requested: row.get::<_, i64>(11)? != 0,
    })
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlowEvent> {
    let run_id: String = row.get(0)?;
    let event_type: String = row.get(2)?;
    let data_str: String = row.get(4)?;
    Ok(FlowEvent {
        run_id: FlowRunId::from_string(&run_id)
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?,
        seq: row.get(1)?,
        event_type: parse_event_type(&event_type),
        ts: row.get::<_, i64>(3)? as u64,
        data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
    })
}

fn parse_flow_status(s: &str) -> FlowStatus {
    match s {
        "pending" => FlowStatus::Pending,
        "running" => FlowStatus::Running,
        "paused" => FlowStatus::Paused,
        "completed" => FlowStatus::Completed,
        "failed" => FlowStatus::Failed,
        _ => FlowStatus::Stopped,
    }
}

fn parse_event_type(s: &str) -> FlowEventType {
    match s {
        "flow_started" => FlowEventType::FlowStarted,
        "flow_completed" => FlowEventType::FlowCompleted,
        "flow_failed" => FlowEventType::FlowFailed,
        "flow_stopped" => FlowEventType::FlowStopped,
        "flow_resumed" => FlowEventType::FlowResumed,
        "flow_paused" => FlowEventType::FlowPaused,
        "step_started" => FlowEventType::StepStarted,
        "step_completed" => FlowEventType::StepCompleted,
        "step_failed" => FlowEventType::StepFailed,
        "diff_updated" => FlowEventType::DiffUpdated,
        "dispatch_created" => FlowEventType::DispatchCreated,
        other => FlowEventType::Custom(other.to_string()),
    }
}

#[cfg(any(test, feature = "test-support"))]
fn uuid_like() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("{nanos:x}-{:?}", std::thread::current().id())
}

impl std::fmt::Debug for FlowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
