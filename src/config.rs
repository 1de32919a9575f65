// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    OpenAI,
    Anthropic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAI => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible APIs (default: https://api.openai.com/v1)
    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// Base URL for the Anthropic API (default: https://api.anthropic.com/v1)
    #[serde(default)]
    pub anthropic_base_url: Option<String>,

    /// File the audit targets, relative to the workspace
    #[serde(default = "default_target_file")]
    pub target_file: String,

    /// Security-related settings file the agent also inspects
    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    /// Directory fix suggestions are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Upper bound on model round-trips per audit (default 8)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Tool output beyond this is truncated in the execution log
    #[serde(default = "default_max_tool_output_chars")]
    pub max_tool_output_chars: usize,

    /// Request timeout in seconds (default 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// LLM temperature (0.0-2.0, default 0.1 for consistent analysis)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per round-trip (default 2048)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "qwen3:4b".into()
}
fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}
fn default_target_file() -> String {
    "vulnerable_script.py".into()
}
fn default_settings_file() -> String {
    "config.yaml".into()
}
fn default_output_dir() -> String {
    "security_suggestions".into()
}
fn default_max_iterations() -> usize {
    8
}
fn default_max_tool_output_chars() -> usize {
    20_000
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    2048
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            ollama_host: default_ollama_host(),
            api_key: None,
            openai_base_url: None,
            anthropic_base_url: None,
            target_file: default_target_file(),
            settings_file: default_settings_file(),
            output_dir: default_output_dir(),
            max_iterations: default_max_iterations(),
            max_tool_output_chars: default_max_tool_output_chars(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Load with priority: CLI > ENV > user config > project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.auditbee.toml in the workspace)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".auditbee.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        // User-level config
        if let Some(path) = Self::config_path() {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
            }
        }

        // Environment variables (AUDITBEE_MODEL, AUDITBEE_PROVIDER, etc.)
        figment = figment.merge(Env::prefixed("AUDITBEE_").split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // CLI overrides (highest priority)
        config.apply_cli(cli);

        // Provider-specific API key fallback, after the effective provider
        // is known
        if config.api_key.is_none() {
            config.api_key = match config.provider {
                Provider::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                Provider::Anthropic => std::env::var("ANTHROPIC_API_KEY").ok(),
                Provider::Ollama => None,
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "auditbee").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref p) = cli.provider {
            self.provider = match p.to_lowercase().as_str() {
                "openai" => Provider::OpenAI,
                "anthropic" => Provider::Anthropic,
                _ => Provider::Ollama,
            };
        }
        if let Some(ref m) = cli.model {
            self.model = m.clone();
        }
        if let Some(ref t) = cli.target {
            self.target_file = t.clone();
        }
        if let Some(ref o) = cli.output_dir {
            self.output_dir = o.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider != Provider::Ollama && self.api_key.is_none() {
            return Err(Error::MissingApiKey {
                provider: self.provider.to_string(),
            });
        }

        if !(1..=64).contains(&self.max_iterations) {
            return Err(Error::Config(format!(
                "max_iterations must be 1–64, got {}",
                self.max_iterations
            )));
        }

        if !(1_000..=200_000).contains(&self.max_tool_output_chars) {
            return Err(Error::Config(format!(
                "max_tool_output_chars must be 1000–200000, got {}",
                self.max_tool_output_chars
            )));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        if self.target_file.is_empty() {
            return Err(Error::Config("target_file cannot be empty".into()));
        }

        if self.output_dir.is_empty() {
            return Err(Error::Config("output_dir cannot be empty".into()));
        }

        match url::Url::parse(&self.ollama_host) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => {
                return Err(Error::Config(format!(
                    "ollama_host must be an http:// or https:// URL, got '{}'",
                    self.ollama_host
                )));
            }
        }

        Ok(())
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# AuditBee Configuration

# LLM provider: ollama, openai, anthropic
provider = "ollama"

# Model name (for Ollama, use `ollama list` to see available)
model = "qwen3:4b"

# Ollama server URL
ollama_host = "http://localhost:11434"

# File the audit targets, relative to the workspace
target_file = "vulnerable_script.py"

# Security-related settings file the agent also inspects
settings_file = "config.yaml"

# Directory fix suggestions are written to
output_dir = "security_suggestions"

# Upper bound on model round-trips per audit
max_iterations = 8

# LLM temperature (keep low for consistent security analysis)
temperature = 0.1

# Maximum tokens to generate per round-trip
# max_tokens = 2048
"#;

        fs::write(&path, content)?;

        // Set secure permissions (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }
}
