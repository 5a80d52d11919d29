// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent subprocess wire protocol (spec §4.2, §6): newline-delimited
//! JSON-RPC. This crate owns framing (one message per line, fatal over a
//! byte budget), the request/response/notification shapes, the method-name
//! vocabulary, and sandbox-policy string normalization. It knows nothing
//! about supervisors, turns, or restarts — those live in `oj-adapters`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod framing;
mod message;
pub mod method;
mod sandbox;

pub use error::WireError;
pub use framing::{read_message, write_message, DEFAULT_MAX_LINE_PREVIEW_BYTES};
pub use message::{Message, Notification, Request, Response, RpcError};
pub use sandbox::normalize_sandbox_policy;
