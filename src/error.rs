// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Target file '{path}' not found")]
    #[diagnostic(
        code(auditbee::audit::target_not_found),
        help("Pass a target path or set target_file in the config")
    )]
    TargetNotFound { path: String },

    #[error("{provider} requires an API key")]
    #[diagnostic(
        code(auditbee::config::missing_api_key),
        help("Set AUDITBEE_API_KEY or the provider's key variable (OPENAI_API_KEY, ANTHROPIC_API_KEY)")
    )]
    MissingApiKey { provider: String },

    #[error("Potential secrets detected in target: {patterns:?}")]
    #[diagnostic(
        code(auditbee::safety::secrets),
        help("Use --allow-secrets, or audit with local Ollama only")
    )]
    SecretsDetected { patterns: Vec<String> },

    #[error("Audit did not complete within {iterations} iterations")]
    #[diagnostic(
        code(auditbee::agent::incomplete),
        help("Raise max_iterations in the config, or try a stronger model")
    )]
    AuditIncomplete { iterations: usize },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Cannot connect to Ollama at {host}")]
    #[diagnostic(
        code(auditbee::ollama::not_running),
        help("Start Ollama with: ollama serve")
    )]
    OllamaNotRunning { host: String },

    #[error("Model '{model}' not found. Available: {}", available.join(", "))]
    #[diagnostic(
        code(auditbee::ollama::model_not_found),
        help("Pull the model with: ollama pull {model}")
    )]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("Provider '{provider}' error: {message}")]
    #[diagnostic(code(auditbee::provider::error))]
    Provider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(auditbee::config::error))]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
