// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

//! Tools the model can invoke during an audit.
//!
//! Tool failures are surfaced as human-readable strings, never errors, so
//! the model can react to them in natural language.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

mod read_file;
mod suggest_fix;

pub use read_file::ReadFileTool;
pub use suggest_fix::SuggestFixTool;

use crate::error::Result;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value, workspace: &Path) -> Result<String>;
}

/// Schema exported to providers for function calling.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The registry an audit runs with: file reading plus fix persistence.
    pub fn for_audit(output_dir: impl Into<std::path::PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(SuggestFixTool::new(output_dir)));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. Unknown tools and execution failures come
    /// back as `Error: ...` strings fed to the model as the tool result.
    pub async fn dispatch(&self, name: &str, args: Value, workspace: &Path) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return format!("Error: Unknown tool '{name}'.");
        };

        match tool.execute(args, workspace).await {
            Ok(output) => output,
            Err(e) => format!("Error: {e}"),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_unknown_tool_returns_error_string() {
        let registry = ToolRegistry::for_audit("security_suggestions");
        let out = registry
            .dispatch("launch_missiles", Value::Null, Path::new("."))
            .await;
        assert_eq!(out, "Error: Unknown tool 'launch_missiles'.");
    }

    #[test]
    fn audit_registry_exports_both_specs() {
        let registry = ToolRegistry::for_audit("security_suggestions");
        let specs = registry.specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["read_file_tool", "suggest_fix_tool"]);
        for spec in &specs {
            assert_eq!(spec.parameters["type"], "object");
        }
    }
}
