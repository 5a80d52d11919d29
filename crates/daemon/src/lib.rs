// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! oj-daemon: the Worker Metadata Registry (spec §3, §6), the worker
//! process entry point that owns one Flow Controller (spec §2, §5), and
//! the hub-side reconciler loop host (spec §4.7). `crates/cli` is the
//! thin binary edge that wires these into a runnable process.

mod boot_id;
mod pid;
mod reconciler_host;
mod registry;
mod worker;

pub use boot_id::current_boot_id;
pub use pid::is_alive;
pub use reconciler_host::{ReconcilerHost, SidecarChecker};
pub use registry::{check_worker_dir, WorkerRegistry};
pub use worker::run_one;
