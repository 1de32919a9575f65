// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

/// Status marker every persisted suggestion carries.
pub const FIX_STATUS: &str = "SECURITY_FIX_SUGGESTED";

/// A fix the model proposed for one audited file. Created per tool
/// invocation, rendered once, written once.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    pub file_path: String,
    pub suggested_code: String,
}

impl FixSuggestion {
    pub fn new(file_path: impl Into<String>, suggested_code: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            suggested_code: suggested_code.into(),
        }
    }

    /// Render the fixed textual template: delimiter lines, file name,
    /// status tag, fenced code block.
    pub fn render(&self) -> String {
        let rule = "-".repeat(50);
        format!(
            "=== SECURITY FIX SUGGESTION ===\n\
             File: {path}\n\
             Status: {status}\n\
             \n\
             Suggested Code:\n\
             {rule}\n\
             {code}\n\
             {rule}\n\
             \n\
             This fix has been documented and is ready for review.\n",
            path = self.file_path,
            status = FIX_STATUS,
            code = self.suggested_code.trim_end(),
        )
    }

    /// Path-stem derived output name; repeat suggestions for the same file
    /// overwrite the previous one.
    pub fn file_name(&self) -> String {
        let stem = Path::new(&self.file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "suggestion".into());
        format!("{stem}_fix.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_status_and_path() {
        let s = FixSuggestion::new("vulnerable_script.py", "print('safe')");
        let out = s.render();
        assert!(out.contains(FIX_STATUS));
        assert!(out.contains("File: vulnerable_script.py"));
        assert!(out.contains("print('safe')"));
        assert!(out.starts_with("=== SECURITY FIX SUGGESTION ==="));
    }

    #[test]
    fn file_name_uses_path_stem() {
        let s = FixSuggestion::new("src/app/vulnerable_script.py", "x");
        assert_eq!(s.file_name(), "vulnerable_script_fix.txt");
    }

    #[test]
    fn file_name_falls_back_without_stem() {
        let s = FixSuggestion::new("", "x");
        assert_eq!(s.file_name(), "suggestion_fix.txt");
    }
}
