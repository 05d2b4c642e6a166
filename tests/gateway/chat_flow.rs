use crate::support::{RelayTestServer, turn};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

async fn post(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("relay request should complete");
    let status = response.status();
    let body = response
        .json()
        .await
        .expect("relay response should be json");
    (status, body)
}

#[tokio::test]
async fn chat_replays_user_history_across_turns() {
    let server = RelayTestServer::start("Hi there").await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "Hi there"}));

    let (status, body) = post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "how are you"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reply"].is_string());

    let prompts = server.generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], turn("hello"));
    let mut expected = turn("hello");
    expected.extend(turn("how are you"));
    assert_eq!(prompts[1], expected);

    server.stop().await;
}

#[tokio::test]
async fn reset_starts_the_conversation_over() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "remember me"}),
    )
    .await;

    let (status, body) = post(&client, server.url("/api/reset"), json!({"session_id": "s1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "reset"}));

    post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "who am i"}),
    )
    .await;
    assert_eq!(server.generator.prompts()[1], turn("who am i"));
}

#[tokio::test]
async fn reset_of_unknown_session_is_acknowledged() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        server.url("/api/reset"),
        json!({"session_id": "never-seen"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reset");
}

#[tokio::test]
async fn sessions_are_isolated() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "alice", "message": "secret"}),
    )
    .await;
    post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "bob", "message": "hi"}),
    )
    .await;

    assert_eq!(server.generator.prompts()[1], turn("hi"));
}

#[tokio::test]
async fn invalid_session_ids_are_rejected_without_side_effects() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    for body in [
        json!({"message": "no id"}),
        json!({"session_id": null, "message": "null id"}),
        json!({"session_id": "", "message": "empty id"}),
        json!({"session_id": "has space", "message": "bad id"}),
    ] {
        let (status, body) = post(&client, server.url("/api/chat"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|e| e.contains("session_id")));
    }

    let (status, _) = post(&client, server.url("/api/reset"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(server.generator.prompts().is_empty());
    let health: Value = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");
    assert_eq!(health["sessions"], 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("malformed request should complete");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error body should be json");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Invalid JSON"))
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({"session_id": "s1", "message": "x".repeat(70_000)}))
        .send()
        .await
        .expect("oversized request should complete");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.generator.prompts().is_empty());
}

#[tokio::test]
async fn concurrent_turns_on_one_session_both_land() {
    let server = RelayTestServer::start_with("ok", Duration::from_millis(50)).await;
    let client = reqwest::Client::new();

    let first = post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "one"}),
    );
    let second = post(
        &client,
        server.url("/api/chat"),
        json!({"session_id": "s1", "message": "two"}),
    );
    let ((first_status, _), (second_status, _)) = tokio::join!(first, second);
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);

    // Whichever turn ran second saw the other in its prompt.
    let prompts = server.generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with(&prompts[0]));
    assert!(prompts[1].len() > prompts[0].len());
}

#[tokio::test]
async fn health_reports_live_sessions() {
    let server = RelayTestServer::start("ok").await;
    let client = reqwest::Client::new();

    for id in ["a", "b", "c"] {
        post(
            &client,
            server.url("/api/chat"),
            json!({"session_id": id, "message": "hi"}),
        )
        .await;
    }
    post(&client, server.url("/api/reset"), json!({"session_id": "b"})).await;

    let health: Value = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");

    assert_eq!(health["status"], "ok");
    assert_eq!(health["sessions"], 2);
    assert_eq!(health["backend"], "recording");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let server = RelayTestServer::start("ok").await;
    let response = reqwest::Client::new()
        .get(server.url("/api/nope"))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
