// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn wire_value_matches_canonical_tag() {
    assert_eq!(
        SandboxPolicy::DangerFullAccess.to_wire_value(),
        serde_json::json!({ "type": "dangerFullAccess" })
    );
}

#[test]
fn default_is_workspace_write() {
    assert_eq!(SandboxPolicy::default(), SandboxPolicy::WorkspaceWrite);
}
