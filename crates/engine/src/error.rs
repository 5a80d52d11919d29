// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Ticket Engine, Outbox archival, Flow Controller, and Reconciler all
//! raise the same shared taxonomy (spec §7) rather than inventing a second
//! error type for this crate, mirroring `oj-adapters`' `AdapterError` alias.

pub use oj_core::CoreError as EngineError;
pub use oj_core::CoreResult as EngineResult;
