// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses `<repo>/.codex-autorunner/config.yml` (spec §6). Parsing itself is
//! explicitly out of scope for the core (spec.md §6: "config.yml (read-only
//! to core; parsed elsewhere)") — "elsewhere" is here, the binary edge.

use std::collections::HashMap;
use std::path::Path;

use oj_core::{Config, CoreError, CoreResult};
use serde::Deserialize;

/// How to spawn one registered agent backend, as written in `config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendFileSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// The full on-disk shape of `config.yml`'s in-scope subset: the engine
/// tunables `oj_core::Config` already knows the schema for, flattened
/// alongside the backend registry this binary alone is responsible for
/// wiring up.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    #[serde(flatten)]
    pub engine: Config,
    pub backends: HashMap<String, BackendFileSpec>,
}

/// Loads `config.yml`, defaulting every field when the file is absent. A
/// malformed file is a `CoreError::Config` — the documented "flow never
/// starts" behavior (spec §7).
pub fn load(path: &Path) -> CoreResult<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
    serde_yaml::from_str(&raw).map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
