// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory file lock guarding `flows.db` for cross-process coordination
//! (spec §9 "per-workspace global locks via file locks"; `SPEC_FULL.md` §2
//! "Lock file for flow-store access"). This is *in addition to* SQLite's own
//! locking, not a replacement — it exists so a second worker process fails
//! fast on startup instead of racing SQLite's busy-timeout.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs4::fs_std::FileExt;

use crate::error::StorageError;

/// Holds an exclusive advisory lock for as long as it is alive; the lock is
/// released on `Drop` (fs4 releases on file close, same as closing the fd).
pub struct FlowStoreLock {
    _file: File,
}

impl FlowStoreLock {
    /// Acquire the lock at `<db_path>.lock`, failing immediately (no
    /// blocking wait) if another process already holds it.
    pub fn acquire(db_path: &Path) -> Result<Self, StorageError> {
        let lock_path = lock_path_for(db_path);
        let file = OpenOptions::new().create(true).write(true).open(&lock_path)?;
        file.try_lock_exclusive().map_err(|e| {
            StorageError::Locked(format!("{}: {e}", lock_path.display()))
        })?;
        Ok(Self { _file: file })
    }
}

fn lock_path_for(db_path: &Path) -> std::path::PathBuf {
    let mut os = db_path.as_os_str().to_owned();
    os.push(".lock");
    std::path::PathBuf::from(os)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
