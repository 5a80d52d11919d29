// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pid liveness check (spec §4.7 step 2), the other half of the
//! registry's "pid is not alive" test alongside boot-id discrimination.

/// `kill(pid, 0)` — sends no signal, only checks permission/existence
/// (the same technique `oj-adapters::handle` uses to target a live
/// subprocess, spec §4.2 `close()`).
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    // No portable liveness check outside unix `kill(pid, 0)`; treat as
    // alive so the reconciler never force-stops a run it cannot actually
    // verify is dead.
    true
}

#[cfg(test)]
#[path = "pid_tests.rs"]
mod tests;
