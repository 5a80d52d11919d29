// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical sandbox policy (spec §4.2, §6, testable property #10).

use serde::{Deserialize, Serialize};

/// The per-turn permission envelope, normalized to one of four canonical
/// variants regardless of how the caller spelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SandboxPolicy {
    DangerFullAccess,
    ReadOnly,
    WorkspaceWrite,
    ExternalSandbox,
}

impl SandboxPolicy {
    /// The wire-format type tag, e.g. `"dangerFullAccess"`.
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::DangerFullAccess => "dangerFullAccess",
            Self::ReadOnly => "readOnly",
            Self::WorkspaceWrite => "workspaceWrite",
            Self::ExternalSandbox => "externalSandbox",
        }
    }

    /// The outbound object form the wire protocol sends: `{type: <tag>}`.
    pub fn to_wire_value(self) -> serde_json::Value {
        serde_json::json!({ "type": self.type_tag() })
    }
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::WorkspaceWrite
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
