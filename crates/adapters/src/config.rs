// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

/// How to spawn the agent subprocess for one registered backend id
/// (spec §4.2 "Spawns an agent subprocess ... with a per-workspace,
/// isolated environment").
#[derive(Debug, Clone)]
pub struct AgentBackendConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Merged over the worker's own environment; isolates two workspaces
    /// from colliding on the backend's scratch directory.
    pub env: HashMap<String, String>,
    pub client_name: String,
    pub client_version: Option<String>,
}

impl AgentBackendConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            client_name: "oj-worker".to_string(),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
