// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

pub mod anthropic;
pub mod ollama;
pub mod openai;

use crate::config::{Config, Provider};
use crate::domain::{ChatMessage, ChatResponse};
use crate::error::Result;
use crate::services::tools::ToolSpec;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// One non-streaming round-trip with tool definitions attached.
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse>;

    /// Cheap reachability/credentials check before the audit starts.
    async fn verify(&self) -> Result<()>;

    fn name(&self) -> &str;
}

pub fn create_provider(config: &Config) -> Result<Box<dyn LlmProvider>> {
    match config.provider {
        Provider::Ollama => Ok(Box::new(ollama::OllamaProvider::new(config))),
        Provider::OpenAI => Ok(Box::new(openai::OpenAiProvider::new(config))),
        Provider::Anthropic => Ok(Box::new(anthropic::AnthropicProvider::new(config))),
    }
}
