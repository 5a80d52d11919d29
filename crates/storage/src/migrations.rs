// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rusqlite::Connection;

use crate::error::StorageResult;

/// Idempotent schema creation. There is exactly one migration today; this
/// still lives in its own function so a second migration has somewhere to
/// land without touching `FlowStore::open`.
pub fn run(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS flow_run (
            id              TEXT PRIMARY KEY,
            flow_type       TEXT NOT NULL,
            status          TEXT NOT NULL,
            current_step    TEXT,
            input_data      TEXT NOT NULL,
            state           TEXT NOT NULL,
            metadata        TEXT NOT NULL,
            error_message   TEXT,
            created_at      INTEGER NOT NULL,
            started_at      INTEGER,
            finished_at     INTEGER,
            stop_requested  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_flow_run_type_status
            ON flow_run (flow_type, status);

        CREATE TABLE IF NOT EXISTS flow_event (
            run_id      TEXT NOT NULL,
            seq         INTEGER NOT NULL,
            event_type  TEXT NOT NULL,
            ts          INTEGER NOT NULL,
            data        TEXT NOT NULL,
            PRIMARY KEY (run_id, seq)
        );

        CREATE TABLE IF NOT EXISTS step_execution (
            run_id       TEXT NOT NULL,
            step_name    TEXT NOT NULL,
            attempt      INTEGER NOT NULL,
            status       TEXT NOT NULL,
            started_at   INTEGER NOT NULL,
            finished_at  INTEGER,
            error        TEXT,
            PRIMARY KEY (run_id, step_name, attempt)
        );
        "#,
    )?;
    Ok(())
}
