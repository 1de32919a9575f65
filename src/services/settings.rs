// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

//! Reads the audited YAML settings file. Deliberately schema-free: the
//! agent reasons about whatever keys are present, we only surface the
//! `security` section for display.

use std::path::Path;

#[derive(Debug, Default)]
pub struct SettingsSummary {
    /// Key/value pairs under the top-level `security` section
    pub security: Vec<(String, String)>,
}

/// Missing or unparsable files are a notice, not an error: the audit still
/// runs and the model sees the raw file through read_file_tool.
pub fn load_summary(path: &Path) -> Option<SettingsSummary> {
    let raw = std::fs::read_to_string(path).ok()?;
    let value: serde_yaml::Value = serde_yaml::from_str(&raw).ok()?;

    let mut summary = SettingsSummary::default();

    if let Some(security) = value.get("security").and_then(|v| v.as_mapping()) {
        for (k, v) in security {
            let key = k.as_str().unwrap_or_default().to_string();
            let rendered = match v {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => serde_yaml::to_string(other)
                    .unwrap_or_default()
                    .trim_end()
                    .to_string(),
            };
            summary.security.push((key, rendered));
        }
    }

    Some(summary)
}
