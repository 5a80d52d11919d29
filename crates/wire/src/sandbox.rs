// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox-policy string normalization (spec §4.2 "Sandbox policy string
//! normalization", testable property #10).

use oj_core::SandboxPolicy;
use serde_json::Value;

/// Accept free-form user input — a bare string in any casing/separator
/// style, or an object `{type: "..."}` — and canonicalize to one of the
/// four [`SandboxPolicy`] variants. Returns `None` for anything
/// unrecognized; callers fall back to the configured default.
pub fn normalize_sandbox_policy(input: &Value) -> Option<SandboxPolicy> {
    let raw = match input {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("type")?.as_str()?,
        _ => return None,
    };
    let canon: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    match canon.to_ascii_lowercase().as_str() {
        "dangerfullaccess" => Some(SandboxPolicy::DangerFullAccess),
        "readonly" => Some(SandboxPolicy::ReadOnly),
        "workspacewrite" => Some(SandboxPolicy::WorkspaceWrite),
        "externalsandbox" => Some(SandboxPolicy::ExternalSandbox),
        _ => None,
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
