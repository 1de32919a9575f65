// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::Tool;
use crate::domain::FixSuggestion;
use crate::error::Result;

/// Formats a suggested fix into the fixed report template and persists it
/// under the suggestions directory, creating it if absent.
pub struct SuggestFixTool {
    output_dir: PathBuf,
}

impl SuggestFixTool {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn resolved_dir(&self, workspace: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            workspace.join(&self.output_dir)
        }
    }
}

#[async_trait]
impl Tool for SuggestFixTool {
    fn name(&self) -> &str {
        "suggest_fix_tool"
    }

    fn description(&self) -> &str {
        "Outputs a suggested code fix in a structured format and saves it \
         for review. Use this tool to document your security \
         recommendations and provide safe, refactored code that addresses \
         the identified vulnerabilities."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path where the fix should be applied"
                },
                "suggested_code": {
                    "type": "string",
                    "description": "The suggested fixed code block"
                }
            },
            "required": ["path", "suggested_code"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> Result<String> {
        let Some(path) = args["path"].as_str() else {
            return Ok("Error: Missing 'path' argument.".into());
        };
        let Some(code) = args["suggested_code"].as_str() else {
            return Ok("Error: Missing 'suggested_code' argument.".into());
        };

        let suggestion = FixSuggestion::new(path, code);
        let rendered = suggestion.render();

        let dir = self.resolved_dir(workspace);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            return Ok(format!("Error suggesting fix for '{path}': {e}"));
        }

        let file = dir.join(suggestion.file_name());
        match tokio::fs::write(&file, &rendered).await {
            Ok(()) => Ok(format!(
                "{rendered}\n✓ Fix suggestion saved to: {}",
                file.display()
            )),
            Err(e) => Ok(format!("Error suggesting fix for '{path}': {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_arguments_are_error_strings() {
        let tool = SuggestFixTool::new("security_suggestions");
        let out = tool
            .execute(json!({"path": "a.py"}), Path::new("."))
            .await
            .unwrap();
        assert_eq!(out, "Error: Missing 'suggested_code' argument.");

        let out = tool.execute(json!({}), Path::new(".")).await.unwrap();
        assert_eq!(out, "Error: Missing 'path' argument.");
    }
}
