// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter for subprocess restarts (spec §4.2
//! "Restart policy": initial 0.5s, cap 30s, ±10% jitter; resets on
//! successful re-init).

use std::time::Duration;

use oj_core::Config;

#[derive(Debug, Clone, Default)]
pub struct BackoffState {
    attempts: u32,
}

impl BackoffState {
    pub fn new() -> Self {
        Self { attempts: 0 }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn record_failure(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the *next* spawn attempt. Zero on the very first try.
    pub fn next_delay(&self, cfg: &Config) -> Duration {
        if self.attempts == 0 {
            return Duration::ZERO;
        }
        let base = cfg.restart_backoff_initial_seconds * 2f64.powi((self.attempts - 1) as i32);
        let capped = base.min(cfg.restart_backoff_max_seconds);
        let jitter_span = capped * cfg.restart_backoff_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_span;
        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
