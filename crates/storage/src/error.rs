// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use oj_core::CoreError;

/// Errors raised by the Flow Store (spec §4.1).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run {0} already exists")]
    DuplicateRun(String),

    #[error("run {0} not found")]
    RunNotFound(String),

    #[error("cannot transition run {run_id} out of terminal status {status}")]
    TerminalTransition { run_id: String, status: String },

    #[error("advisory lock held by another process: {0}")]
    Locked(String),
}

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        CoreError::Internal(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
