// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticket file data model (spec §3, §6).
//!
//! A ticket is `TICKET-NNN[-suffix].md` under
//! `<workspace>/.codex-autorunner/tickets/`: YAML frontmatter plus a
//! free-text markdown body. Parsing the frontmatter bytes happens in
//! `oj-engine` (it is filesystem I/O); this module only defines the shape
//! and the sentinel-agent rule.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentId;

/// Sentinel values `agent` may take, recognized before falling back to a
/// registered backend id.
pub const AGENT_SENTINEL_PAUSE: &str = "pause";
pub const AGENT_SENTINEL_USER: &str = "user";

/// Resolved classification of a ticket's `agent` field (spec §4.5 step 3,
/// §6 "sentinel agent").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentRefKind {
    /// `agent: "pause"` — halts until `done: true`.
    Pause,
    /// `agent: "user"` — human-owned; treated as a regular pause until done.
    User,
    /// A registered backend id (e.g. `codex`, `opencode`).
    Registered(AgentId),
}

impl AgentRefKind {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Pause | Self::User)
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            AGENT_SENTINEL_PAUSE => Self::Pause,
            AGENT_SENTINEL_USER => Self::User,
            other => Self::Registered(AgentId::new(other)),
        }
    }
}

/// Required + optional ticket frontmatter keys (spec §3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketFrontmatter {
    pub agent: String,
    pub done: bool,
    pub title: Option<String>,
    pub goal: Option<String>,
    pub model: Option<String>,
    pub reasoning: Option<String>,
    pub ticket_kind: Option<String>,
}

/// The index parsed out of `TICKET-NNN[-suffix].md`. Must be unique within
/// the ticket directory (spec §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TicketIndex(pub u32);

impl fmt::Display for TicketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Parse the numeric index out of a ticket filename.
///
/// Accepts `TICKET-<N digits, N>=3>[-suffix].md`; returns `None` for
/// anything else (callers skip non-ticket files silently).
pub fn parse_ticket_filename(name: &str) -> Option<(TicketIndex, String)> {
    let stem = name.strip_suffix(".md")?;
    let rest = stem.strip_prefix("TICKET-")?;
    let digits_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits_len < 3 {
        return None;
    }
    let (digits, suffix) = rest.split_at(digits_len);
    let index: u32 = digits.parse().ok()?;
    Some((TicketIndex(index), suffix.to_string()))
}

/// A fully loaded ticket: its parsed index, frontmatter, and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub index: TicketIndex,
    pub filename: String,
    pub frontmatter: TicketFrontmatter,
    pub body: String,
}

impl Ticket {
    pub fn agent_ref(&self) -> AgentRefKind {
        AgentRefKind::parse(&self.frontmatter.agent)
    }
}

#[cfg(test)]
#[path = "ticket_tests.rs"]
mod tests;
