use crate::support::wait_until_ready;
use chatrelay::Config;
use chatrelay::transport::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EOS: u32 = 50_256;

async fn mount_tokenize(server: &MockServer, content: &str, tokens: &[u32]) {
    Mock::given(method("POST"))
        .and(path("/tokenize"))
        .and(body_partial_json(json!({"content": content})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tokens": tokens})))
        .mount(server)
        .await;
}

async fn mount_completion(server: &MockServer, prompt: &[u32], generated: &[u32]) {
    Mock::given(method("POST"))
        .and(path("/completion"))
        .and(body_partial_json(json!({"prompt": prompt})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tokens": generated, "content": ""})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_detokenize(server: &MockServer, tokens: &[u32], content: &str) {
    Mock::given(method("POST"))
        .and(path("/detokenize"))
        .and(body_partial_json(json!({"tokens": tokens})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": content})))
        .mount(server)
        .await;
}

async fn start_relay(
    backend_url: &str,
) -> (u16, tokio::task::JoinHandle<chatrelay::error::Result<()>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral relay listener should bind");
    let port = listener
        .local_addr()
        .expect("ephemeral relay listener should expose local address")
        .port();

    let mut config = Config::default();
    config.generation.base_url = backend_url.to_string();
    config.generation.timeout_secs = 5;
    config.gateway.request_timeout_secs = 10;

    let handle = tokio::spawn(run_gateway_with_listener(listener, Arc::new(config)));
    wait_until_ready(port).await;
    (port, handle)
}

#[tokio::test]
async fn relay_drives_llamacpp_token_endpoints() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&backend)
        .await;

    mount_tokenize(&backend, "hello", &[31_373]).await;
    mount_tokenize(&backend, "how are you", &[4919, 389, 345]).await;

    // Partial matching lets a short expected array match a longer prompt, so
    // the two-turn prompt is mounted first.
    mount_completion(
        &backend,
        &[31_373, EOS, 4919, 389, 345, EOS],
        &[40, 716, 3734, EOS],
    )
    .await;
    mount_completion(&backend, &[31_373, EOS], &[17_250, EOS]).await;

    mount_detokenize(&backend, &[17_250], "Hi").await;
    mount_detokenize(&backend, &[40, 716, 3734], "I am fine").await;

    let (port, handle) = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/api/chat");

    let first: Value = client
        .post(&url)
        .json(&json!({"session_id": "s1", "message": "hello"}))
        .send()
        .await
        .expect("first chat should complete")
        .json()
        .await
        .expect("first reply should be json");
    assert_eq!(first, json!({"reply": "Hi"}));

    let second: Value = client
        .post(&url)
        .json(&json!({"session_id": "s1", "message": "how are you"}))
        .send()
        .await
        .expect("second chat should complete")
        .json()
        .await
        .expect("second reply should be json");
    assert_eq!(second, json!({"reply": "I am fine"}));

    let health: Value = client
        .get(format!("http://127.0.0.1:{port}/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");
    assert_eq!(health["backend"], "llama.cpp");
    assert_eq!(health["sessions"], 1);

    handle.abort();
}

#[tokio::test]
async fn backend_outage_surfaces_as_bad_gateway() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tokenize"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Loading model"))
        .mount(&backend)
        .await;

    let (port, handle) = start_relay(&backend.uri()).await;
    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/api/chat"))
        .json(&json!({"session_id": "s1", "message": "hello"}))
        .send()
        .await
        .expect("chat should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.expect("error body should be json");
    let message = body["error"].as_str().expect("error should be a string");
    assert!(!message.contains("Loading model"));

    handle.abort();
}
