// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

//! Audit loop and provider wire-format tests against mock HTTP servers.

mod helpers;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auditbee::config::{Config, Provider};
use auditbee::error::Error;
use auditbee::services::agent::AuditAgent;
use auditbee::services::llm::LlmProvider;
use auditbee::services::llm::anthropic::AnthropicProvider;
use auditbee::services::llm::ollama::OllamaProvider;
use auditbee::services::llm::openai::OpenAiProvider;
use auditbee::services::tools::ToolRegistry;

fn openai_config(base_url: &str) -> Config {
    Config {
        provider: Provider::OpenAI,
        api_key: Some("sk-test".into()),
        openai_base_url: Some(base_url.to_string()),
        ..Config::default()
    }
}

fn tool_call_body(name: &str, arguments: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

fn final_body(text: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

// ─── audit loop ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn agent_runs_tool_round_trip_to_report() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[("app.py", "eval(input())\n")]);

    // First round-trip asks for a file read, second delivers the report.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_body(
            "read_file_tool",
            r#"{"path":"app.py"}"#,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(final_body("Audit complete: eval on user input.")),
        )
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 8, 20_000).with_progress(false);

    let outcome = agent
        .run("Audit app.py", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report, "Audit complete: eval on user input.");

    // Execution log: call, result, final response
    use auditbee::domain::EventKind;
    let kinds: Vec<EventKind> = outcome.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::ToolCall, EventKind::ToolResult, EventKind::Response]
    );
    assert_eq!(outcome.events[1].detail, "eval(input())\n");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn agent_feeds_tool_result_back_to_model() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[("app.py", "MARKER_CONTENT_42\n")]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_body(
            "read_file_tool",
            r#"{"path":"app.py"}"#,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // The second request must carry the tool output in its transcript.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("MARKER_CONTENT_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_body("done")))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 8, 20_000).with_progress(false);

    let outcome = agent
        .run("Audit app.py", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.report, "done");
}

#[tokio::test]
async fn agent_stops_after_max_iterations() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[("app.py", "pass\n")]);

    // The model never stops asking for the file.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_body(
            "read_file_tool",
            r#"{"path":"app.py"}"#,
        )))
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 2, 20_000).with_progress(false);

    let err = agent
        .run("Audit app.py", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuditIncomplete { iterations: 2 }));
}

#[tokio::test]
async fn agent_surfaces_provider_http_error() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 8, 20_000).with_progress(false);

    let err = agent
        .run("Audit", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.contains("500"), "got: {message}");
        }
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn agent_marks_token_truncated_report() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[]);

    // The model runs out of tokens mid-sentence.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "The audit found a SQL injection in"
                },
                "finish_reason": "length"
            }]
        })))
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 8, 20_000).with_progress(false);

    let outcome = agent
        .run("Audit", &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.report.starts_with("The audit found a SQL injection in"));
    assert!(
        outcome.report.contains("[report truncated"),
        "a cut-off reply must not pass as a complete report: {}",
        outcome.report
    );
}

#[tokio::test]
async fn agent_aborts_on_cancellation() {
    let server = MockServer::start().await;
    let ws = helpers::make_workspace(&[]);

    // Slow response so the cancellation wins the select
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(final_body("too late"))
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");
    let agent = AuditAgent::new(&provider, &registry, ws.path(), 8, 20_000).with_progress(false);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = agent.run("Audit", &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

// ─── openai wire format ──────────────────────────────────────────────────────

#[tokio::test]
async fn openai_sends_bearer_auth_and_tool_definitions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_string_contains("read_file_tool"))
        .and(body_string_contains("suggest_fix_tool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);
    let registry = ToolRegistry::for_audit("security_suggestions");

    let response = provider
        .chat(
            "You are an auditor",
            &[auditbee::domain::ChatMessage::user("hello")],
            &registry.specs(),
        )
        .await
        .unwrap();
    assert_eq!(response.content.as_deref(), Some("ok"));
}

#[tokio::test]
async fn openai_verify_rejects_bad_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = openai_config(&server.uri());
    let provider = OpenAiProvider::new(&config);

    let err = provider.verify().await.unwrap_err();
    match err {
        Error::Provider { message, .. } => assert_eq!(message, "invalid API key"),
        other => panic!("expected Provider error, got {other:?}"),
    }
}

// ─── anthropic wire format ───────────────────────────────────────────────────

#[tokio::test]
async fn anthropic_parses_text_and_tool_use_blocks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "Reading the file first."},
                {"type": "tool_use", "id": "tu_1", "name": "read_file_tool",
                 "input": {"path": "app.py"}}
            ],
            "stop_reason": "tool_use"
        })))
        .mount(&server)
        .await;

    let config = Config {
        provider: Provider::Anthropic,
        api_key: Some("sk-ant-test".into()),
        anthropic_base_url: Some(format!("{}/v1", server.uri())),
        ..Config::default()
    };
    let provider = AnthropicProvider::new(&config);

    let response = provider
        .chat(
            "system",
            &[auditbee::domain::ChatMessage::user("go")],
            &[],
        )
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("Reading the file first."));
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "tu_1");
    assert_eq!(response.tool_calls[0].name, "read_file_tool");
    assert!(response.tool_calls[0].arguments.contains("app.py"));
}

#[tokio::test]
async fn anthropic_verify_requires_key() {
    let config = Config {
        provider: Provider::Anthropic,
        api_key: Some(String::new()),
        ..Config::default()
    };
    let provider = AnthropicProvider::new(&config);
    let err = provider.verify().await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}

// ─── ollama wire format ──────────────────────────────────────────────────────

fn ollama_config(host: &str) -> Config {
    Config {
        ollama_host: host.to_string(),
        ..Config::default()
    }
}

#[tokio::test]
async fn ollama_health_check_lists_models() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "qwen3:4b"}, {"name": "llama3.2:latest"}]
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri()));
    let models = provider.health_check().await.unwrap();
    assert_eq!(models, vec!["qwen3:4b", "llama3.2:latest"]);
}

#[tokio::test]
async fn ollama_unreachable_host_is_not_running() {
    // Nothing is listening here.
    let provider = OllamaProvider::new(&ollama_config("http://127.0.0.1:1"));
    let err = provider.health_check().await.unwrap_err();
    assert!(matches!(err, Error::OllamaNotRunning { .. }));
}

#[tokio::test]
async fn ollama_missing_model_is_reported_with_alternatives() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.2:latest"}]
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri()));
    let err = provider.verify().await.unwrap_err();
    match err {
        Error::ModelNotFound { model, available } => {
            assert_eq!(model, "qwen3:4b");
            assert_eq!(available, vec!["llama3.2:latest"]);
        }
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_echoes_tool_history_on_follow_up() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "ok"},
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri()));
    let registry = ToolRegistry::for_audit("security_suggestions");

    use auditbee::domain::{ChatMessage, ToolCall};
    let history = vec![
        ChatMessage::user("audit app.py"),
        ChatMessage::assistant(
            None,
            vec![ToolCall {
                id: "call_0".into(),
                name: "read_file_tool".into(),
                arguments: r#"{"path":"app.py"}"#.into(),
            }],
        ),
        ChatMessage::tool("call_0", "read_file_tool", "print()\n"),
    ];

    provider
        .chat("system", &history, &registry.specs())
        .await
        .unwrap();

    // The follow-up request must carry the prior tool calls and name the
    // tool that produced each result.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4); // system, user, assistant, tool

    let assistant = &messages[2];
    assert_eq!(assistant["role"], "assistant");
    assert_eq!(
        assistant["tool_calls"][0]["function"]["name"],
        "read_file_tool"
    );
    assert_eq!(
        assistant["tool_calls"][0]["function"]["arguments"]["path"],
        "app.py"
    );

    let tool = &messages[3];
    assert_eq!(tool["role"], "tool");
    assert_eq!(tool["tool_name"], "read_file_tool");
    assert_eq!(tool["content"], "print()\n");
}

#[tokio::test]
async fn ollama_synthesizes_tool_call_ids() {
    let server = MockServer::start().await;

    // Ollama sends arguments as an object and carries no call ids.
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "read_file_tool", "arguments": {"path": "a.py"}}},
                    {"function": {"name": "read_file_tool", "arguments": {"path": "b.py"}}}
                ]
            },
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri()));
    let registry = ToolRegistry::for_audit("security_suggestions");

    let response = provider
        .chat(
            "system",
            &[auditbee::domain::ChatMessage::user("go")],
            &registry.specs(),
        )
        .await
        .unwrap();

    assert_eq!(response.tool_calls.len(), 2);
    assert_eq!(response.tool_calls[0].id, "call_0");
    assert_eq!(response.tool_calls[1].id, "call_1");
    assert!(response.tool_calls[0].arguments.contains("a.py"));
}
