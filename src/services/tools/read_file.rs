// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::Tool;
use crate::error::Result;

/// Whole-file read, no size limit, no streaming. Missing or unreadable
/// files come back as error strings the model can reason about.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file_tool"
    }

    fn description(&self) -> &str {
        "Reads and returns the complete contents of a specified file. \
         Use this tool to examine source code files for security \
         vulnerabilities. Input should be a valid file path relative to \
         the workspace root."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> Result<String> {
        let Some(path) = args["path"].as_str() else {
            return Ok("Error: Missing 'path' argument.".into());
        };

        // An absolute path would escape the workspace via join
        if Path::new(path).is_absolute() {
            return Ok(format!(
                "Error: Path '{path}' must be relative to the workspace."
            ));
        }

        let file_path = workspace.join(path);

        if !file_path.exists() {
            return Ok(format!("Error: File '{path}' not found."));
        }

        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Ok(content),
            Err(e) => Ok(format!("Error reading file '{path}': {e}")),
        }
    }
}
