use std::collections::HashMap;
use std::sync::Arc;

use oj_adapters::{DefaultApprovalHandler, NoopNotificationHandler};
use oj_core::{AgentTurnRequest, Config, SandboxPolicy, TurnInputItem};

use super::*;
use crate::config::BackendFileSpec;

#[tokio::test]
async fn unregistered_agent_fails_without_panicking() {
    let pool = AgentPool::new(
        std::env::temp_dir(),
        Config::default(),
        Arc::new(DefaultApprovalHandler::default()),
        Arc::new(NoopNotificationHandler),
    );

    let result = pool
        .run_turn(AgentTurnRequest {
            agent_id: AgentId::new("codex"),
            conversation_id: None,
            input: vec![TurnInputItem::text("hi")],
            approval_policy: "on-request".to_string(),
            sandbox_policy: SandboxPolicy::default(),
            cwd: std::env::temp_dir(),
        })
        .await;

    assert!(!result.is_success());
}

#[tokio::test]
async fn register_all_makes_the_agent_resolvable() {
    let pool = AgentPool::new(
        std::env::temp_dir(),
        Config::default(),
        Arc::new(DefaultApprovalHandler::default()),
        Arc::new(NoopNotificationHandler),
    );
    let mut backends = HashMap::new();
    backends.insert(
        "codex".to_string(),
        BackendFileSpec { command: "definitely-not-a-real-binary".to_string(), args: vec![], env: HashMap::new() },
    );
    let config = FileConfig { engine: Config::default(), backends };

    register_all(&pool, &config);

    // The backend is now registered, so the pool attempts a spawn (and
    // fails, since the binary doesn't exist) rather than rejecting the
    // agent id outright.
    let result = pool
        .run_turn(AgentTurnRequest {
            agent_id: AgentId::new("codex"),
            conversation_id: None,
            input: vec![TurnInputItem::text("hi")],
            approval_policy: "on-request".to_string(),
            sandbox_policy: SandboxPolicy::default(),
            cwd: std::env::temp_dir(),
        })
        .await;
    assert!(!result.is_success());
    assert!(!pool.has_live_handle(&AgentId::new("codex")));
}
