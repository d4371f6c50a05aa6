// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the HTTP archive sink against a wiremock server.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_core::archive::ArchiveSink;
use parley_core::types::{
    ChannelKind, Conversation, ConversationId, ConversationState, Message, TenantId, UserId,
};
use parley_persist::HttpArchiveSink;

fn ended_conversation() -> Conversation {
    Conversation {
        id: ConversationId("web:u1".into()),
        tenant_id: TenantId("acme".into()),
        user_id: UserId("u1".into()),
        channel: ChannelKind::Web,
        assigned_connection: None,
        messages: vec![
            Message::user("I need a human"),
            Message::system("agent joined"),
            Message::agent("how can I help?"),
        ],
        state: ConversationState::Ended,
    }
}

fn sink(endpoint: String, max_attempts: u32) -> HttpArchiveSink {
    HttpArchiveSink::new(
        endpoint,
        Duration::from_secs(2),
        max_attempts,
        Duration::from_millis(10),
    )
    .expect("sink should build")
}

#[tokio::test]
async fn delivers_conversation_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = sink(format!("{}/conversations", server.uri()), 3);
    sink.archive(&ended_conversation()).await.expect("should deliver");

    // Body carries the full message list and tenant/channel metadata.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["tenant_id"], "acme");
    assert_eq!(body["channel"], "web");
    assert_eq!(body["state"], "ended");
    assert_eq!(body["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn retries_after_server_error_then_succeeds() {
    let server = MockServer::start().await;
    // First attempt fails, later attempts succeed.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sink = sink(server.uri(), 3);
    sink.archive(&ended_conversation())
        .await
        .expect("retry should recover");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = sink(server.uri(), 2);
    let err = sink
        .archive(&ended_conversation())
        .await
        .expect_err("should give up");
    assert_eq!(err.code(), "archive");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_archive_error() {
    // Nothing listens on this port.
    let sink = sink("http://127.0.0.1:9".to_string(), 1);
    let err = sink
        .archive(&ended_conversation())
        .await
        .expect_err("should fail");
    assert_eq!(err.code(), "archive");
}
