// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LlmProvider;
use crate::config::Config;
use crate::domain::{ChatMessage, ChatResponse, Role, StopReason, ToolCall};
use crate::error::{Error, Result};
use crate::services::tools::ToolSpec;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config
                .anthropic_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub async fn verify_connection(&self) -> Result<()> {
        // Anthropic doesn't have a lightweight endpoint for verification,
        // so we just validate that the key looks plausible
        if self.api_key.is_empty() {
            return Err(Error::Provider {
                provider: "anthropic".into(),
                message: "API key not configured".into(),
            });
        }
        Ok(())
    }

    /// The messages API only knows user/assistant turns; tool results ride
    /// as `tool_result` blocks on a user message, and consecutive tool
    /// results must coalesce into one.
    fn to_wire(messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire: Vec<WireMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System | Role::User => {
                    wire.push(WireMessage {
                        role: "user",
                        content: vec![WireBlock::Text {
                            text: msg.content.clone().unwrap_or_default(),
                        }],
                    });
                }
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if let Some(text) = &msg.content {
                        if !text.is_empty() {
                            blocks.push(WireBlock::Text { text: text.clone() });
                        }
                    }
                    for call in &msg.tool_calls {
                        let input: Value =
                            serde_json::from_str(&call.arguments).unwrap_or(Value::Null);
                        blocks.push(WireBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input,
                        });
                    }
                    wire.push(WireMessage {
                        role: "assistant",
                        content: blocks,
                    });
                }
                Role::Tool => {
                    let block = WireBlock::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone().unwrap_or_default(),
                    };
                    match wire.last_mut() {
                        Some(last) if last.role == "user"
                            && matches!(last.content.first(), Some(WireBlock::ToolResult { .. })) =>
                        {
                            last.content.push(block);
                        }
                        _ => wire.push(WireMessage {
                            role: "user",
                            content: vec![block],
                        }),
                    }
                }
            }
        }

        wire
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse> {
        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&MessagesRequest {
                model: self.model.clone(),
                system: system.to_string(),
                messages: Self::to_wire(messages),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tools
                    .iter()
                    .map(|t| WireTool {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        input_schema: t.parameters.clone(),
                    })
                    .collect(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Provider {
                        provider: "anthropic".into(),
                        message: "request timed out".into(),
                    }
                } else {
                    Error::Provider {
                        provider: "anthropic".into(),
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "anthropic".into(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: MessagesResponse = response.json().await.map_err(|e| Error::Provider {
            provider: "anthropic".into(),
            message: format!("malformed response: {e}"),
        })?;

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();

        for block in body.content {
            match block {
                ResponseBlock::Text { text } => text_parts.push(text),
                ResponseBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input.to_string(),
                }),
                ResponseBlock::Other => {}
            }
        }

        let stop_reason = match body.stop_reason.as_deref() {
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            _ if !tool_calls.is_empty() => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };

        let content = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            stop_reason,
        })
    }

    async fn verify(&self) -> Result<()> {
        self.verify_connection().await
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
