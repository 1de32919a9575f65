// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Create a temp workspace populated with the given files.
#[allow(dead_code)]
pub fn make_workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp workspace");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write workspace file");
    }
    dir
}

/// Read a persisted suggestion back from the output directory.
#[allow(dead_code)]
pub fn read_suggestion(workspace: &Path, output_dir: &str, file_name: &str) -> String {
    fs::read_to_string(workspace.join(output_dir).join(file_name))
        .expect("suggestion file should exist")
}
