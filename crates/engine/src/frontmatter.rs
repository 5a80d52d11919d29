// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML-frontmatter splitting for ticket and dispatch markdown files (spec
//! §6 on-disk layout). There is no ported reference for this helper; it is
//! an original design following the conventional `---`-fenced frontmatter
//! shape spec.md's ticket schema describes (see `DESIGN.md`).

use serde_json::Value;

/// Splits `raw` into `(frontmatter, body)`. `frontmatter` is
/// [`Value::Null`] when no leading `---` fence is found, or when the
/// fenced block fails to parse as YAML. The body is always the full
/// remainder of the file after the closing fence (or all of `raw` when
/// there is no fence).
pub fn parse_markdown_frontmatter(raw: &str) -> (Value, String) {
    let mut lines = raw.lines();
    let Some(first) = lines.next() else {
        return (Value::Null, String::new());
    };
    if first.trim_end() != "---" {
        return (Value::Null, raw.to_string());
    }

    let mut yaml_lines = Vec::new();
    let mut body_start_offset = None;
    let mut consumed = first.len() + 1;
    for line in lines {
        consumed += line.len() + 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            body_start_offset = Some(consumed.min(raw.len()));
            break;
        }
        yaml_lines.push(line);
    }

    let Some(offset) = body_start_offset else {
        return (Value::Null, raw.to_string());
    };

    let yaml_block = yaml_lines.join("\n");
    let body = raw.get(offset..).unwrap_or("").to_string();

    let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(&yaml_block);
    match parsed {
        Ok(yaml_value) => match serde_json::to_value(yaml_value) {
            Ok(json_value) => (json_value, body),
            Err(_) => (Value::Null, raw.to_string()),
        },
        Err(_) => (Value::Null, raw.to_string()),
    }
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
