// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt construction (spec §4.5 step 5). Grounded on
//! `original_source/.../tickets/files.py`'s `safe_relpath` for how
//! attachment paths are listed to the agent.

use std::path::{Path, PathBuf};

use oj_core::outbox::ReplyRecord;
use oj_core::ticket::Ticket;

/// Fixed preamble describing the contract every turn operates under.
pub const PREAMBLE: &str = "\
You are operating inside an autonomous coding workflow. You will be given \
one ticket at a time. Make the changes it describes, update its \
frontmatter's `done` field to `true` only once the work is complete and \
verified, and leave a clear summary of what you did. If you need to hand \
control back to a human, write `DISPATCH.md` in the run directory with \
YAML frontmatter `mode: pause` (or `notify` for a non-blocking update) \
and your message as the body.";

/// Names of optional pinned docs looked up under `contextspace/` and
/// appended verbatim when present (spec §4.5 step 5, §6 on-disk layout).
const PINNED_DOC_NAMES: &[&str] = &["active_context.md", "decisions.md", "spec.md"];

/// Reads every pinned doc that exists under `contextspace_dir`, in the
/// fixed order listed above, as `(name, contents)` pairs.
pub fn pinned_docs(contextspace_dir: &Path) -> Vec<(String, String)> {
    let mut docs = Vec::new();
    for name in PINNED_DOC_NAMES {
        let path = contextspace_dir.join(name);
        if let Ok(contents) = std::fs::read_to_string(&path) {
            docs.push((name.to_string(), contents));
        }
    }
    docs
}

/// Relative-path-or-fallback-to-absolute, matching the original's
/// `safe_relpath`: prefer a path relative to `root`, fall back to the
/// absolute path when `path` isn't under `root`.
fn safe_relpath(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

pub struct PromptContext<'a> {
    pub ticket: &'a Ticket,
    pub lint_errors: &'a [String],
    pub replies: &'a [ReplyRecord],
    pub previous_agent_output: Option<&'a str>,
    pub pinned_docs: &'a [(String, String)],
    pub workspace_root: &'a Path,
}

/// Assembles the full prompt: preamble, lint errors to fix, unconsumed
/// replies (with attachments listed by relative path), the ticket's
/// verbatim content, the previous turn's output if the ticket is still
/// open, then any pinned docs (spec §4.5 step 5).
pub fn build_prompt(ctx: &PromptContext) -> String {
    let mut sections: Vec<String> = vec![PREAMBLE.to_string()];

    if !ctx.lint_errors.is_empty() {
        let mut block = String::from("The previous turn left this ticket's frontmatter invalid. Fix it:\n");
        for err in ctx.lint_errors {
            block.push_str("- ");
            block.push_str(err);
            block.push('\n');
        }
        sections.push(block);
    }

    for record in ctx.replies {
        let mut block = format!("[USER_REPLY {:04}]\n{}\n", record.seq, record.reply.body.trim());
        let attachments: Vec<PathBuf> = record
            .archived_files
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) != Some("USER_REPLY.md"))
            .cloned()
            .collect();
        if !attachments.is_empty() {
            block.push_str("Attachments:\n");
            for attachment in &attachments {
                block.push_str("- ");
                block.push_str(&safe_relpath(attachment, ctx.workspace_root));
                block.push('\n');
            }
        }
        sections.push(block);
    }

    sections.push(format!(
        "## {} ({})\n\n{}",
        ctx.ticket.frontmatter.title.as_deref().unwrap_or(&ctx.ticket.filename),
        ctx.ticket.filename,
        ctx.ticket.body.trim()
    ));

    if let Some(previous) = ctx.previous_agent_output {
        if !previous.trim().is_empty() {
            sections.push(format!("Previous turn's output on this ticket:\n{}", previous.trim()));
        }
    }

    for (name, contents) in ctx.pinned_docs {
        sections.push(format!("## {name}\n\n{}", contents.trim()));
    }

    sections.join("\n\n")
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
