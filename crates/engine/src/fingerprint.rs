// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo working-tree fingerprint for the resume gate (spec §4.6
//! `ResumeFlow`, §9 open question: "the exact rules for the repo
//! fingerprint ... are implementation-defined; a hash over the working
//! tree that excludes `.codex-autorunner/runs/` is sufficient"). This is
//! an original design, not ported from anywhere in the retrieval pack: it
//! hashes each tracked file's relative path, size, and mtime rather than
//! file contents, trading a (very small) chance of a missed change for
//! avoiding a full read of every file on every pause.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};

use crate::error::EngineResult;

const EXCLUDED_DIRS: &[&str] = &[".git"];

/// Hashes the working tree rooted at `workspace_root`, excluding
/// `.codex-autorunner/runs/` and any `.git` directory. Deterministic given
/// the same file set, sizes, and mtimes.
pub fn repo_fingerprint(workspace_root: &Path) -> EngineResult<String> {
    let mut files = Vec::new();
    collect_files(workspace_root, workspace_root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for relpath in &files {
        let full = workspace_root.join(relpath);
        let meta = std::fs::metadata(&full)?;
        let mtime_nanos = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        hasher.update(relpath.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(meta.len().to_le_bytes());
        hasher.update(mtime_nanos.to_le_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if file_type.is_dir() {
            if EXCLUDED_DIRS.contains(&name) {
                continue;
            }
            if name == "runs" && path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) == Some(".codex-autorunner") {
                continue;
            }
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            if let Ok(relpath) = path.strip_prefix(root) {
                out.push(relpath.to_path_buf());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
