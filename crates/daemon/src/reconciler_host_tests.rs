use std::sync::Arc;
use std::time::Duration;

use oj_core::{Config, FakeClock, FlowStatus};
use oj_storage::{FlowStore, StatusUpdate};

use super::*;

fn running_run(store: &FlowStore) -> FlowRunId {
    let id = FlowRunId::new();
    store.create_run(id, "ticket_flow", serde_json::json!({}), serde_json::json!({}), 0).unwrap();
    store
        .update_status(id, FlowStatus::Running, StatusUpdate { started_at: Some(0), ..Default::default() })
        .unwrap();
    id
}

#[test]
fn scan_once_transitions_orphans_using_the_sidecar_checker() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let run_id = running_run(&store);
    let config = Config::default();
    let host = ReconcilerHost::new(store.clone(), &config, FakeClock::new());

    let report = host.scan_once().unwrap();
    assert_eq!(report.transitioned, vec![run_id]);
    assert_eq!(store.get_run(run_id).unwrap().unwrap().status, FlowStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn run_until_stops_when_signalled() {
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let config = Config {
        reconciler_fast_interval_seconds: 1,
        reconciler_idle_interval_seconds: 1,
        ..Config::default()
    };
    let host = ReconcilerHost::new(store, &config, FakeClock::new());
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = tokio::spawn(async move { host.run_until(rx).await });
    tokio::time::advance(Duration::from_millis(10)).await;
    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}
