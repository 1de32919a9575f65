// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

//! Persona and task text. This is prompt engineering, not an auditing
//! algorithm: all vulnerability reasoning happens in the model.

use crate::services::tools::ToolSpec;

const PERSONA: &str = "\
You are a Senior Python Security Auditor, a highly experienced security \
professional with over 15 years of expertise in application security. You \
meticulously review code for OWASP Top 10 vulnerabilities including SQL \
Injection (SQLi), Cross-Site Scripting (XSS), Command Injection, and other \
security flaws. You have a deep understanding of secure coding practices \
and always suggest industry-standard fixes. Your recommendations are \
precise, actionable, and help developers write more secure code.";

/// System prompt: persona plus the tools available this run.
pub fn system_prompt(tools: &[ToolSpec]) -> String {
    let mut out = String::from(PERSONA);
    out.push_str("\n\nYou have access to the following tools:\n");
    for tool in tools {
        out.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    out.push_str(
        "\nUse the tools to inspect files before drawing conclusions. When \
         you are done, reply with the final audit report as plain text and \
         make no further tool calls.",
    );
    out
}

/// The audit task for one target/settings pair.
pub fn audit_task(target_file: &str, settings_file: &str) -> String {
    format!(
        "Perform a comprehensive security audit with the following steps:\n\
         \n\
         1. Use the read_file_tool to analyze '{target_file}' and identify \
         all security vulnerabilities present in the code. Look specifically \
         for:\n\
         \x20  - Command Injection vulnerabilities (unsafe command execution)\n\
         \x20  - SQL Injection vulnerabilities (unsafe query construction)\n\
         \x20  - Cross-Site Scripting (XSS) vulnerabilities (unsafe content rendering)\n\
         \x20  - Any other OWASP Top 10 security issues\n\
         \n\
         2. Use the read_file_tool to check '{settings_file}' for related \
         security configuration variables that may impact the vulnerabilities.\n\
         \n\
         3. For each identified vulnerability, provide:\n\
         \x20  - A clear description of the security risk\n\
         \x20  - The potential impact if exploited\n\
         \x20  - OWASP category classification\n\
         \n\
         4. Use the suggest_fix_tool to provide a precise, safe refactored \
         code block for the most critical vulnerability. The fix should \
         follow security best practices, use safe alternatives, include \
         proper input validation, and add comments explaining the fix.\n\
         \n\
         Finish with a report that lists every identified vulnerability with \
         its OWASP classification, assesses the configuration file's security \
         settings, and closes with secure coding recommendations."
    )
}
