use std::sync::Arc;

use async_trait::async_trait;
use oj_core::{FakeClock, FlowRun, FlowStatus, RunPaths, StepOutcome};
use oj_engine::{FlowController, FlowDefinition, FlowStep};
use oj_storage::FlowStore;
use tempfile::tempdir;

use super::*;
use crate::registry::WorkerRegistry;

struct CompletesImmediately;

#[async_trait]
impl FlowStep for CompletesImmediately {
    async fn run(&self, _run: &FlowRun) -> StepOutcome {
        StepOutcome::Complete { output: serde_json::json!({}) }
    }
}

#[tokio::test]
async fn run_one_registers_and_clears_the_sidecar() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FlowStore::open_in_memory().unwrap());
    let clock = FakeClock::new();
    let definition = FlowDefinition::ticket_flow(Arc::new(CompletesImmediately));
    let controller = FlowController::new(store.clone(), definition, clock.clone());
    let registry = WorkerRegistry::new(RunPaths {
        workspace_root: dir.path().to_string_lossy().to_string(),
        runs_dir: "runs".to_string(),
    });

    let run = controller
        .start_flow(FlowRunId::new(), serde_json::json!({}), serde_json::json!({}))
        .unwrap();

    let finished = run_one(&controller, &registry, run.id, &clock).await.unwrap();
    assert_eq!(finished.status, FlowStatus::Completed);

    let check = registry.check_worker(run.id);
    assert!(!check.alive, "sidecar should be cleared after a clean completion");
}
