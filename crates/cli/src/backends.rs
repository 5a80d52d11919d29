// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires `config.yml`'s `backends` map into a live [`AgentPool`] (spec §4.3
//! "Validate `agent_id`; reject if not registered").

use oj_adapters::{AgentBackendConfig, AgentPool};
use oj_core::AgentId;

use crate::config::FileConfig;

pub fn register_all(pool: &AgentPool, config: &FileConfig) {
    for (agent_id, spec) in &config.backends {
        let mut backend = AgentBackendConfig::new(spec.command.clone()).args(spec.args.clone());
        for (key, value) in &spec.env {
            backend = backend.env(key.clone(), value.clone());
        }
        pool.register_backend(AgentId::new(agent_id.clone()), backend);
    }
}

#[cfg(test)]
#[path = "backends_tests.rs"]
mod tests;
