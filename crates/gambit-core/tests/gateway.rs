use gambit_core::{
    Agent, ChatCompletionsGateway, GatewayConfig, GatewayError, ModelGateway, ModelResponder,
    PromptBlock,
};
use gambit_memory::{MessageEnvelope, Role};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, api_key: Option<&str>) -> GatewayConfig {
    GatewayConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: api_key.map(str::to_string),
        model: "test-model".to_string(),
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn posts_blocks_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                { "role": "system", "content": "S" },
                { "role": "user", "content": "## Dialogue History\nA: hi" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ChatCompletionsGateway::new(config(&server, Some("secret")));
    let payload = vec![
        PromptBlock::new(Role::System, "S"),
        PromptBlock::new(Role::User, "## Dialogue History\nA: hi"),
    ];

    let text = gateway.send(&payload).await.expect("send");
    assert_eq!(text, "hello");
}

#[tokio::test]
async fn error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let gateway = ChatCompletionsGateway::new(config(&server, Some("wrong")));
    let err = gateway.send(&[]).await.expect_err("unauthorized");

    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_content_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let gateway = ChatCompletionsGateway::new(config(&server, None));
    let err = gateway.send(&[]).await.expect_err("malformed");
    assert!(matches!(err, GatewayError::Malformed(_)));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let gateway = ChatCompletionsGateway::new(config(&server, None));
    let err = gateway.send(&[]).await.expect_err("malformed");
    assert!(matches!(err, GatewayError::Malformed(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let gateway = ChatCompletionsGateway::new(GatewayConfig {
        endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        api_key: None,
        model: "test-model".to_string(),
    });
    let err = gateway.send(&[]).await.expect_err("unreachable");
    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn agent_turn_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(r#"{"thought":"ok","move":[4,4]}"#)),
        )
        .mount(&server)
        .await;

    let gateway = ChatCompletionsGateway::new(config(&server, Some("secret")));
    let mut agent = Agent::new("B", ModelResponder::new(Arc::new(gateway)));

    let reply = agent
        .reply(Some(MessageEnvelope::new("A", json!([3, 3]), Role::User)))
        .await
        .expect("reply");

    assert_eq!(reply.content(), &json!([4, 4]));
    assert_eq!(agent.memory().size(), 2);
}
