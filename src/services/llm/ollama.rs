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

pub struct OllamaProvider {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    // Ollama exchanges arguments as a JSON object, not a string
    arguments: Value,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            // Sanitize: remove trailing slashes to avoid //api/chat
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// List models served by the Ollama instance.
    pub async fn health_check(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|_| Error::OllamaNotRunning {
                    host: self.host.clone(),
                })?;

        if !response.status().is_success() {
            return Err(Error::OllamaNotRunning {
                host: self.host.clone(),
            });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| Error::Provider {
            provider: "ollama".into(),
            message: format!("malformed /api/tags response: {e}"),
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Verify the configured model is actually served.
    pub async fn verify_model(&self) -> Result<()> {
        let available = self.health_check().await?;
        if available.iter().any(|m| m == &self.model) {
            Ok(())
        } else {
            Err(Error::ModelNotFound {
                model: self.model.clone(),
                available,
            })
        }
    }

    /// Assistant turns echo their `tool_calls` and tool results carry the
    /// producing tool's name, per the /api/chat message format.
    fn to_wire(system: &str, messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire = vec![WireMessage {
            role: "system",
            content: system.to_string(),
            tool_calls: Vec::new(),
            tool_name: None,
        }];

        for msg in messages {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };
            wire.push(WireMessage {
                role,
                content: msg.content.clone().unwrap_or_default(),
                tool_calls: msg
                    .tool_calls
                    .iter()
                    .map(|c| WireToolCall {
                        function: WireFunctionCall {
                            name: c.name.clone(),
                            arguments: serde_json::from_str(&c.arguments)
                                .unwrap_or(Value::Null),
                        },
                    })
                    .collect(),
                tool_name: msg.tool_name.clone(),
            });
        }

        wire
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.host);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: self.model.clone(),
                messages: Self::to_wire(system, messages),
                stream: false,
                tools: tools
                    .iter()
                    .map(|t| WireTool {
                        kind: "function",
                        function: WireFunctionDef {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
                options: Options {
                    temperature: self.temperature,
                    num_predict: self.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| Error::Provider {
                provider: "ollama".into(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "ollama".into(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: ChatResponseBody = response.json().await.map_err(|e| Error::Provider {
            provider: "ollama".into(),
            message: format!("malformed response: {e}"),
        })?;

        // Ollama tool calls carry no id; synthesize stable ones so the
        // transcript stays linkable
        let tool_calls: Vec<ToolCall> = body
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, c)| ToolCall {
                id: format!("call_{i}"),
                name: c.function.name,
                arguments: c.function.arguments.to_string(),
            })
            .collect();

        let stop_reason = if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };

        let content = if body.message.content.is_empty() {
            None
        } else {
            Some(body.message.content)
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            stop_reason,
        })
    }

    async fn verify(&self) -> Result<()> {
        self.verify_model().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
