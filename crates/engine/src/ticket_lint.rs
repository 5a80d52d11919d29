// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontmatter validation for ticket and dispatch files (spec §6, §7
//! `Lint` error kind). Grounded on `original_source/.../tickets/lint.py`'s
//! `lint_ticket_frontmatter`/`lint_dispatch_frontmatter`, adapted to this
//! crate's `serde_json::Value`-based frontmatter shape rather than a raw
//! Python dict, and to `oj_core::ticket::TicketFrontmatter`'s fixed field
//! set (no legacy `depends_on` rejection: that key has no counterpart in
//! this schema).

use serde_json::Value;

use oj_core::outbox::{Dispatch, DispatchMode};
use oj_core::ticket::TicketFrontmatter;

fn as_optional_str(value: &Value, key: &str, errors: &mut Vec<String>) -> Option<String> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(format!("'{key}' must be a string"));
            None
        }
    }
}

/// Validates a parsed ticket frontmatter block. Returns the normalized
/// frontmatter when there are no errors.
pub fn lint_ticket_frontmatter(data: &Value) -> (Option<TicketFrontmatter>, Vec<String>) {
    let mut errors = Vec::new();

    if !data.is_object() && !data.is_null() {
        errors.push("ticket frontmatter must be a mapping".to_string());
        return (None, errors);
    }
    let obj = data.as_object().cloned().unwrap_or_default();
    let obj = Value::Object(obj);

    let agent = match obj.get("agent") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            errors.push("'agent' must not be empty".to_string());
            None
        }
        Some(_) => {
            errors.push("'agent' must be a string".to_string());
            None
        }
        None => {
            errors.push("missing required field 'agent'".to_string());
            None
        }
    };

    let done = match obj.get("done") {
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push("'done' must be a boolean".to_string());
            None
        }
        None => {
            errors.push("missing required field 'done'".to_string());
            None
        }
    };

    let title = as_optional_str(&obj, "title", &mut errors);
    let goal = as_optional_str(&obj, "goal", &mut errors);
    let model = as_optional_str(&obj, "model", &mut errors);
    let reasoning = as_optional_str(&obj, "reasoning", &mut errors);
    let ticket_kind = as_optional_str(&obj, "ticket_kind", &mut errors);

    if !errors.is_empty() {
        return (None, errors);
    }

    let (Some(agent), Some(done)) = (agent, done) else {
        return (None, errors);
    };

    (
        Some(TicketFrontmatter {
            agent,
            done,
            title,
            goal,
            model,
            reasoning,
            ticket_kind,
        }),
        errors,
    )
}

/// Validates and normalizes a parsed `DISPATCH.md` frontmatter block.
/// `mode` defaults to [`DispatchMode::Notify`] when absent (spec §6).
pub fn lint_dispatch_frontmatter(data: &Value, body: &str) -> (Option<Dispatch>, Vec<String>) {
    let mut errors = Vec::new();

    if !data.is_object() && !data.is_null() {
        errors.push("dispatch frontmatter must be a mapping".to_string());
        return (None, errors);
    }
    let obj = data.as_object().cloned().unwrap_or_default();

    let mode = match obj.get("mode") {
        None | Some(Value::Null) => DispatchMode::Notify,
        Some(Value::String(s)) => match s.as_str() {
            "notify" => DispatchMode::Notify,
            "pause" => DispatchMode::Pause,
            "turn_summary" => DispatchMode::TurnSummary,
            other => {
                errors.push(format!(
                    "'mode' must be one of notify, pause, turn_summary (got '{other}')"
                ));
                DispatchMode::Notify
            }
        },
        Some(_) => {
            errors.push("'mode' must be a string".to_string());
            DispatchMode::Notify
        }
    };

    let title = as_optional_str(&Value::Object(obj.clone()), "title", &mut errors);

    if !errors.is_empty() {
        return (None, errors);
    }

    let mut extra = obj;
    extra.remove("mode");
    extra.remove("title");

    (
        Some(Dispatch {
            mode,
            body: body.to_string(),
            title,
            extra,
        }),
        errors,
    )
}

#[cfg(test)]
#[path = "ticket_lint_tests.rs"]
mod tests;
