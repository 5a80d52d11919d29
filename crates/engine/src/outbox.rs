// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem archival for the dispatch (agent→human) and reply
//! (human→agent) mailboxes (spec §4.4). Sequence numbers themselves are
//! never derived by scanning a directory here — the Ticket Engine tracks
//! `outbox_seq`/`reply_seq` in flow state and passes the next value in.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use oj_core::outbox::{
    seq_dir_name, Dispatch, DispatchRecord, OutboxPaths, Reply, ReplyPaths, ReplyRecord,
};
use oj_core::CoreError;

use crate::error::EngineResult;
use crate::frontmatter::parse_markdown_frontmatter;
use crate::ticket_lint::lint_dispatch_frontmatter;

const DISPATCH_FILENAME: &str = "DISPATCH.md";
const REPLY_FILENAME: &str = "USER_REPLY.md";

pub fn ensure_outbox_dirs(paths: &OutboxPaths) -> EngineResult<()> {
    fs::create_dir_all(&paths.run_dir)?;
    fs::create_dir_all(&paths.dispatch_history_dir)?;
    Ok(())
}

pub fn ensure_reply_dirs(paths: &ReplyPaths) -> EngineResult<()> {
    fs::create_dir_all(&paths.run_dir)?;
    fs::create_dir_all(&paths.reply_history_dir)?;
    Ok(())
}

/// Every file directly under `run_dir` worth archiving alongside a
/// dispatch or reply: not hidden, not the staging file itself, not the
/// sibling mailbox's own staging file, not the history directories.
fn staging_siblings(run_dir: &Path, exclude: &str) -> std::io::Result<Vec<PathBuf>> {
    if !run_dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(run_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with('.') || name == exclude || name == DISPATCH_FILENAME || name == REPLY_FILENAME {
            continue;
        }
        out.push(entry.path());
    }
    out.sort();
    Ok(out)
}

/// Moves `src_dir`'s staging file plus its siblings into
/// `history_dir/<seq:04d>/`. Files are moved one rename at a time; a crash
/// partway leaves some files already archived and the rest still staged,
/// which a retried archival call will pick up again on the next attempt
/// since the staging file itself is always moved last.
fn archive_into(
    src_dir: &Path,
    staging_file: &Path,
    siblings: &[PathBuf],
    history_dir: &Path,
    seq: u32,
) -> std::io::Result<(PathBuf, Vec<PathBuf>)> {
    let archived_dir = history_dir.join(seq_dir_name(seq));
    fs::create_dir_all(&archived_dir)?;

    let mut archived_files = Vec::new();
    for sibling in siblings {
        let Some(name) = sibling.file_name() else { continue };
        let dest = archived_dir.join(name);
        fs::rename(sibling, &dest)?;
        archived_files.push(dest);
    }

    let staging_name = staging_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let dest = archived_dir.join(&staging_name);
    fs::rename(staging_file, &dest)?;

    let _ = src_dir;
    Ok((archived_dir, archived_files))
}

/// ArchiveDispatch (spec §4.4): `None` when no `DISPATCH.md` is staged.
/// A lint failure surfaces as [`CoreError::Lint`] and must pause the flow
/// rather than lose the staged file.
pub fn archive_dispatch(paths: &OutboxPaths, next_seq: u32) -> EngineResult<Option<DispatchRecord>> {
    if !paths.dispatch_path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&paths.dispatch_path)?;
    let (fm_value, body) = parse_markdown_frontmatter(&raw);
    let (dispatch, errors) = lint_dispatch_frontmatter(&fm_value, &body);
    let Some(dispatch) = dispatch else {
        return Err(CoreError::Lint {
            path: paths.dispatch_path.display().to_string(),
            errors,
        });
    };

    let siblings = staging_siblings(&paths.run_dir, DISPATCH_FILENAME)?;
    let (archived_dir, mut archived_files) = archive_into(
        &paths.run_dir,
        &paths.dispatch_path,
        &siblings,
        &paths.dispatch_history_dir,
        next_seq,
    )?;
    archived_files.push(archived_dir.join(DISPATCH_FILENAME));
    archived_files.sort();

    debug!(seq = next_seq, dir = %archived_dir.display(), "dispatch archived");
    Ok(Some(DispatchRecord { seq: next_seq, dispatch, archived_dir, archived_files }))
}

/// CreateTurnSummary (spec §4.4, `SPEC_FULL.md`'s synthetic-turn-summary
/// supplement): synthesizes a `mode: turn_summary` dispatch straight into
/// history when the agent didn't write its own `DISPATCH.md`, so the UI
/// always has something to show for a completed turn. Skipped when the
/// agent produced no visible output at all.
pub fn create_turn_summary(
    paths: &OutboxPaths,
    seq: u32,
    agent_output: &str,
    title: Option<&str>,
) -> EngineResult<Option<DispatchRecord>> {
    if agent_output.trim().is_empty() {
        return Ok(None);
    }

    let archived_dir = paths.dispatch_history_dir.join(seq_dir_name(seq));
    fs::create_dir_all(&archived_dir)?;
    let dest = archived_dir.join(DISPATCH_FILENAME);
    let frontmatter_title = title
        .map(|t| format!("title: {t}\n"))
        .unwrap_or_default();
    let contents = format!("---\nmode: turn_summary\n{frontmatter_title}---\n\n{agent_output}\n");
    fs::write(&dest, contents)?;

    let dispatch = Dispatch {
        mode: oj_core::outbox::DispatchMode::TurnSummary,
        body: agent_output.to_string(),
        title: title.map(str::to_string),
        extra: serde_json::Map::new(),
    };
    debug!(seq, dir = %archived_dir.display(), "synthetic turn summary archived");
    Ok(Some(DispatchRecord { seq, dispatch, archived_dir, archived_files: vec![dest] }))
}

/// DispatchReply (spec §4.4, symmetric to [`archive_dispatch`]): `None`
/// when no `USER_REPLY.md` is staged.
pub fn dispatch_reply(paths: &ReplyPaths, next_seq: u32) -> EngineResult<Option<ReplyRecord>> {
    if !paths.reply_path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&paths.reply_path)?;
    let (fm_value, body) = parse_markdown_frontmatter(&raw);
    let extra = fm_value.as_object().cloned().unwrap_or_default();
    let reply = Reply { body, extra };

    let siblings = staging_siblings(&paths.run_dir, REPLY_FILENAME)?;
    let (archived_dir, mut archived_files) = archive_into(
        &paths.run_dir,
        &paths.reply_path,
        &siblings,
        &paths.reply_history_dir,
        next_seq,
    )?;
    archived_files.push(archived_dir.join(REPLY_FILENAME));
    archived_files.sort();

    debug!(seq = next_seq, dir = %archived_dir.display(), "reply archived");
    Ok(Some(ReplyRecord { seq: next_seq, reply, archived_dir, archived_files }))
}

/// Loads every archived reply with `seq > after_seq`, ascending, so the
/// Ticket Engine can inject them into the next prompt (spec §4.5 step 5)
/// without tracking a second "consumed" counter: this scan is idempotent
/// and self-healing if a crash lands between archival and consumption
/// (spec §8 property #5).
pub fn load_unconsumed_replies(paths: &ReplyPaths, after_seq: u32) -> EngineResult<Vec<ReplyRecord>> {
    if !paths.reply_history_dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(&paths.reply_history_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Ok(seq) = name.parse::<u32>() else { continue };
        if seq <= after_seq {
            continue;
        }
        let reply_file = entry.path().join(REPLY_FILENAME);
        if !reply_file.exists() {
            warn!(dir = %entry.path().display(), "archived reply directory missing USER_REPLY.md");
            continue;
        }
        let raw = fs::read_to_string(&reply_file)?;
        let (fm_value, body) = parse_markdown_frontmatter(&raw);
        let extra = fm_value.as_object().cloned().unwrap_or_default();
        let archived_files = fs::read_dir(entry.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        records.push(ReplyRecord {
            seq,
            reply: Reply { body, extra },
            archived_dir: entry.path(),
            archived_files,
        });
    }
    records.sort_by_key(|r| r.seq);
    Ok(records)
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
