// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_captures_all_fields() {
    let meta = WorkerMetadata::new(1234, "boot-abc", 1_700_000_000_000);
    assert_eq!(meta.pid, 1234);
    assert_eq!(meta.boot_id, "boot-abc");
    assert_eq!(meta.started_at, 1_700_000_000_000);
}

#[test]
fn serializes_as_plain_json_object() {
    let meta = WorkerMetadata::new(1, "boot", 0);
    let value = serde_json::to_value(meta).unwrap();
    assert_eq!(value["pid"], 1);
    assert_eq!(value["boot_id"], "boot");
}
