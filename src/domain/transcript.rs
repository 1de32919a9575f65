// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ToolCall,
    ToolResult,
    Response,
}

/// One entry of the audit execution log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub kind: EventKind,
    pub detail: String,
}

impl AuditEvent {
    pub fn tool_call(name: &str, arguments: &str) -> Self {
        Self {
            kind: EventKind::ToolCall,
            detail: format!("{name} {arguments}"),
        }
    }

    pub fn tool_result(output: &str, max_chars: usize) -> Self {
        Self {
            kind: EventKind::ToolResult,
            detail: truncate(output, max_chars),
        }
    }

    pub fn response(content: &str, max_chars: usize) -> Self {
        Self {
            kind: EventKind::Response,
            detail: truncate(content, max_chars),
        }
    }
}

/// Truncate on a char boundary for log display.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{cut}... [truncated]")
}
