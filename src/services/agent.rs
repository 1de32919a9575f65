// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

//! The audit loop: one sequential conversation, tool calls dispatched
//! between model round-trips, no retries, no parallelism.

use std::path::PathBuf;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{AuditEvent, ChatMessage, StopReason, truncate};
use crate::error::{Error, Result};
use crate::services::llm::LlmProvider;
use crate::services::prompt;
use crate::services::tools::ToolRegistry;

#[derive(Debug)]
pub struct AuditOutcome {
    /// Final free-text report from the model
    pub report: String,
    pub events: Vec<AuditEvent>,
}

pub struct AuditAgent<'a> {
    provider: &'a dyn LlmProvider,
    tools: &'a ToolRegistry,
    workspace: PathBuf,
    max_iterations: usize,
    max_log_chars: usize,
    show_progress: bool,
}

impl<'a> AuditAgent<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        tools: &'a ToolRegistry,
        workspace: impl Into<PathBuf>,
        max_iterations: usize,
        max_log_chars: usize,
    ) -> Self {
        Self {
            provider,
            tools,
            workspace: workspace.into(),
            max_iterations,
            max_log_chars,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn run(&self, task: &str, cancel: &CancellationToken) -> Result<AuditOutcome> {
        let specs = self.tools.specs();
        let system = prompt::system_prompt(&specs);

        let mut messages = vec![ChatMessage::user(task)];
        let mut events: Vec<AuditEvent> = Vec::new();

        for iteration in 0..self.max_iterations {
            debug!(iteration = iteration + 1, "contacting model");

            let spinner = self.spinner();
            let response = tokio::select! {
                _ = cancel.cancelled() => {
                    if let Some(s) = &spinner {
                        s.finish_and_clear();
                    }
                    return Err(Error::Cancelled);
                }
                res = self.provider.chat(&system, &messages, &specs) => {
                    if let Some(s) = &spinner {
                        s.finish_and_clear();
                    }
                    res?
                }
            };

            if !response.tool_calls.is_empty() {
                messages.push(ChatMessage::assistant(
                    response.content.clone(),
                    response.tool_calls.clone(),
                ));

                for call in &response.tool_calls {
                    if self.show_progress {
                        eprintln!(
                            "{} {} {}",
                            style("tool:").cyan(),
                            style(&call.name).bold(),
                            truncate(&call.arguments, 120),
                        );
                    }
                    events.push(AuditEvent::tool_call(&call.name, &call.arguments));

                    let args: serde_json::Value =
                        serde_json::from_str(&call.arguments).unwrap_or(serde_json::Value::Null);
                    let result = self.tools.dispatch(&call.name, args, &self.workspace).await;

                    debug!(
                        tool = %call.name,
                        result_len = result.len(),
                        "tool executed"
                    );
                    events.push(AuditEvent::tool_result(&result, self.max_log_chars));
                    messages.push(ChatMessage::tool(&call.id, &call.name, result));
                }

                continue;
            }

            // No tool calls: the model is done
            if let Some(content) = response.content {
                if !content.trim().is_empty() {
                    let mut report = content.trim().to_string();
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!("model hit the token limit mid-report");
                        report.push_str(
                            "\n\n[report truncated: token limit reached; raise max_tokens in the config]",
                        );
                    }
                    events.push(AuditEvent::response(&report, self.max_log_chars));
                    return Ok(AuditOutcome { report, events });
                }
            }

            return Err(Error::Provider {
                provider: self.provider.name().into(),
                message: "empty response".into(),
            });
        }

        Err(Error::AuditIncomplete {
            iterations: self.max_iterations,
        })
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or(ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("waiting for {}...", self.provider.name()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}
