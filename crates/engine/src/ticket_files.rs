// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticket directory listing and loading (spec §6). Grounded on
//! `original_source/.../tickets/files.py`'s `list_ticket_paths`,
//! `read_ticket`, `ticket_is_done`, adapted to return `Result`s instead of
//! `(value, errors)` tuples since every caller here either has a full
//! ticket or a hard error, never both.

use std::fs;
use std::path::{Path, PathBuf};

use oj_core::ticket::{parse_ticket_filename, Ticket, TicketIndex};

use crate::frontmatter::parse_markdown_frontmatter;
use crate::ticket_lint::lint_ticket_frontmatter;

/// Failure modes for loading a single ticket file.
#[derive(Debug, thiserror::Error)]
pub enum TicketReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid frontmatter in {path}: {}", errors.join("; "))]
    Lint { path: PathBuf, errors: Vec<String> },
}

/// Lists every `TICKET-NNN[-suffix].md` file directly under `ticket_dir`,
/// sorted by parsed numeric index. Non-matching filenames are skipped.
pub fn list_ticket_paths(ticket_dir: &Path) -> std::io::Result<Vec<(TicketIndex, PathBuf)>> {
    if !ticket_dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(ticket_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((index, _suffix)) = parse_ticket_filename(name) {
            entries.push((index, entry.path()));
        }
    }
    entries.sort_by_key(|(index, path)| (*index, path.clone()));
    Ok(entries)
}

/// Reports every duplicate-index and frontmatter error across a ticket
/// directory, without stopping at the first one (spec §7 "surface every
/// lint error in one pass").
pub fn lint_ticket_directory(ticket_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut errors = Vec::new();
    let mut by_index: std::collections::BTreeMap<TicketIndex, Vec<PathBuf>> =
        std::collections::BTreeMap::new();

    for (index, path) in list_ticket_paths(ticket_dir)? {
        by_index.entry(index).or_default().push(path);
    }

    for (index, paths) in &by_index {
        if paths.len() > 1 {
            let names: Vec<String> = paths
                .iter()
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
                .collect();
            errors.push(format!(
                "Duplicate ticket index {index}: multiple files share the same index ({}). \
                 Rename or remove duplicates to ensure deterministic ordering.",
                names
                    .iter()
                    .map(|n| format!("'{n}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        for path in paths {
            if let Err(e) = read_ticket(path) {
                if let TicketReadError::Lint { errors: lint_errors, .. } = e {
                    for le in lint_errors {
                        errors.push(format!("{}: {le}", path.display()));
                    }
                }
            }
        }
    }

    Ok(errors)
}

/// Reads and validates one ticket file.
pub fn read_ticket(path: &Path) -> Result<Ticket, TicketReadError> {
    let raw = fs::read_to_string(path).map_err(|source| TicketReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let (index, _suffix) = parse_ticket_filename(&filename).unwrap_or((TicketIndex(0), String::new()));

    let (fm_value, body) = parse_markdown_frontmatter(&raw);
    let (frontmatter, errors) = lint_ticket_frontmatter(&fm_value);
    let Some(frontmatter) = frontmatter else {
        return Err(TicketReadError::Lint {
            path: path.to_path_buf(),
            errors,
        });
    };

    Ok(Ticket {
        index,
        filename,
        frontmatter,
        body,
    })
}

/// Reads a ticket's `done` flag only, defaulting to `false` on any read or
/// lint failure (spec §4.5 step 2 "skip tickets that fail to parse as not
/// done", matching `ticket_is_done`'s original fail-open behavior).
pub fn ticket_is_done(path: &Path) -> bool {
    read_ticket(path).map(|t| t.frontmatter.done).unwrap_or(false)
}

#[cfg(test)]
#[path = "ticket_files_tests.rs"]
mod tests;
