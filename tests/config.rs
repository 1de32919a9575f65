// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use auditbee::config::{Config, Provider};
use auditbee::error::Error;

#[test]
fn defaults_target_the_demo_files() {
    let config = Config::default();
    assert_eq!(config.provider, Provider::Ollama);
    assert_eq!(config.model, "qwen3:4b");
    assert_eq!(config.target_file, "vulnerable_script.py");
    assert_eq!(config.settings_file, "config.yaml");
    assert_eq!(config.output_dir, "security_suggestions");
    assert_eq!(config.max_iterations, 8);
    assert_eq!(config.timeout_secs, 300);
}

#[test]
fn defaults_pass_validation() {
    Config::default().validate().expect("defaults must be valid");
}

#[test]
fn parses_full_toml() {
    let config: Config = toml::from_str(
        r#"
        provider = "openai"
        model = "gpt-4o"
        api_key = "sk-test"
        target_file = "app.py"
        output_dir = "fixes"
        max_iterations = 4
        temperature = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(config.provider, Provider::OpenAI);
    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.target_file, "app.py");
    assert_eq!(config.output_dir, "fixes");
    assert_eq!(config.max_iterations, 4);
    config.validate().unwrap();
}

#[test]
fn partial_toml_fills_in_defaults() {
    let config: Config = toml::from_str(r#"model = "llama3.2""#).unwrap();
    assert_eq!(config.model, "llama3.2");
    assert_eq!(config.provider, Provider::Ollama);
    assert_eq!(config.target_file, "vulnerable_script.py");
}

#[test]
fn cloud_provider_without_key_is_rejected() {
    for provider in [Provider::OpenAI, Provider::Anthropic] {
        let config = Config {
            provider,
            api_key: None,
            ..Config::default()
        };
        match config.validate() {
            Err(Error::MissingApiKey { provider: p }) => {
                assert_eq!(p, provider.to_string());
            }
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
    }
}

#[test]
fn ollama_needs_no_key() {
    let config = Config {
        provider: Provider::Ollama,
        api_key: None,
        ..Config::default()
    };
    config.validate().unwrap();
}

#[test]
fn rejects_out_of_range_values() {
    let cases: Vec<Config> = vec![
        Config {
            max_iterations: 0,
            ..Config::default()
        },
        Config {
            max_iterations: 100,
            ..Config::default()
        },
        Config {
            temperature: 3.0,
            ..Config::default()
        },
        Config {
            temperature: -0.5,
            ..Config::default()
        },
        Config {
            timeout_secs: 0,
            ..Config::default()
        },
        Config {
            max_tool_output_chars: 10,
            ..Config::default()
        },
    ];
    for config in cases {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

#[test]
fn rejects_non_http_ollama_host() {
    for host in ["localhost:11434", "ftp://example.com", ""] {
        let config = Config {
            ollama_host: host.to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

#[test]
fn rejects_empty_target_and_output_dir() {
    let config = Config {
        target_file: String::new(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(Error::Config(_))));

    let config = Config {
        output_dir: String::new(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn provider_display_is_lowercase() {
    assert_eq!(Provider::Ollama.to_string(), "ollama");
    assert_eq!(Provider::OpenAI.to_string(), "openai");
    assert_eq!(Provider::Anthropic.to_string(), "anthropic");
}
