use super::*;
use std::path::PathBuf;

#[test]
fn second_acquire_on_same_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db_path: PathBuf = dir.path().join("flows.db");
    let first = FlowStoreLock::acquire(&db_path).unwrap();
    let second = FlowStoreLock::acquire(&db_path);
    assert!(second.is_err());
    drop(first);
    // Released on drop; a subsequent acquire succeeds.
    let third = FlowStoreLock::acquire(&db_path);
    assert!(third.is_ok());
}
