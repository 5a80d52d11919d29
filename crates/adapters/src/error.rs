// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub use oj_core::CoreError as AdapterError;

pub type AdapterResult<T> = Result<T, AdapterError>;
