use serde_json::json;

use super::*;
use crate::api::models::{CharacterListParams, LoginRequest};
use crate::core::credentials::StoredCredentials;
use crate::core::message::Role;
use crate::utils::test_utils::{
    memory_session, message_json, spawn_http_server, user_json, ScriptedResponse,
};

fn tokens_json(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    })
}

#[tokio::test]
async fn login_posts_credentials_without_bearer() {
    let (base, server) = spawn_http_server(vec![ScriptedResponse::json(
        200,
        json!({ "user": user_json("u1", "alice"), "tokens": tokens_json("a1", "r1") }),
    )])
    .await;
    let (session, _) = memory_session(None);
    let client = ApiClient::new(base, session);

    let response = client
        .login(&LoginRequest {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("login should succeed");

    assert_eq!(response.user.username, "alice");
    assert_eq!(response.tokens.access_token, "a1");

    let requests = server.await.expect("server task");
    assert_eq!(requests[0].request_line, "POST /api/auth/login HTTP/1.1");
    assert!(requests[0].header("authorization").is_none());
    assert_eq!(
        requests[0].json(),
        json!({ "username": "alice", "password": "secret" })
    );
}

#[tokio::test]
async fn authenticated_requests_carry_the_access_token() {
    let (base, server) = spawn_http_server(vec![ScriptedResponse::json(
        200,
        json!({ "items": [], "total": 0, "page": 2, "page_size": 10, "pages": 0 }),
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session);

    let page = client
        .list_characters(&CharacterListParams {
            page: Some(2),
            page_size: Some(10),
            search: Some("   ".to_string()),
        })
        .await
        .expect("list should succeed");
    assert_eq!(page.page, 2);

    let requests = server.await.expect("server task");
    assert_eq!(requests[0].header("authorization"), Some("Bearer a1"));
    assert_eq!(
        requests[0].request_line,
        "GET /api/characters?page=2&page_size=10 HTTP/1.1"
    );
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_request_retried_once() {
    let (base, server) = spawn_http_server(vec![
        ScriptedResponse::json(401, json!({ "detail": "Token expired" })),
        ScriptedResponse::json(200, tokens_json("a2", "r2")),
        ScriptedResponse::json(200, user_json("u1", "alice")),
    ])
    .await;
    let (session, credentials) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session.clone());

    let user = client.me().await.expect("retry should succeed");
    assert_eq!(user.id, "u1");
    assert_eq!(session.access_token().as_deref(), Some("a2"));
    assert_eq!(
        credentials.snapshot(),
        StoredCredentials {
            access_token: Some("a2".to_string()),
            refresh_token: Some("r2".to_string()),
        }
    );

    let requests = server.await.expect("server task");
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("authorization"), Some("Bearer a1"));
    assert_eq!(requests[1].request_line, "POST /api/auth/refresh HTTP/1.1");
    assert_eq!(requests[1].json(), json!({ "refresh_token": "r1" }));
    assert_eq!(requests[2].header("authorization"), Some("Bearer a2"));
}

#[tokio::test]
async fn failed_refresh_clears_the_session() {
    let (base, server) = spawn_http_server(vec![
        ScriptedResponse::json(401, json!({ "detail": "Token expired" })),
        ScriptedResponse::json(401, json!({ "detail": "Invalid refresh token" })),
    ])
    .await;
    let (session, credentials) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session.clone());

    let err = client.conversations().await.expect_err("should be rejected");
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "unauthorized: Invalid refresh token");
    assert!(!session.is_authenticated());
    assert_eq!(credentials.snapshot(), StoredCredentials::default());

    assert_eq!(server.await.expect("server task").len(), 2);
}

#[tokio::test]
async fn missing_refresh_token_signs_out_without_calling_refresh() {
    let (base, server) = spawn_http_server(vec![ScriptedResponse::json(
        401,
        json!({ "detail": "Not authenticated" }),
    )])
    .await;
    let (session, _) = memory_session(None);
    let client = ApiClient::new(base, session.clone());

    let err = client.me().await.expect_err("should be rejected");
    assert!(err.is_unauthorized());
    assert_eq!(server.await.expect("server task").len(), 1);
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let (base, _server) = spawn_http_server(vec![ScriptedResponse::json(
        404,
        json!({ "detail": "Conversation not found" }),
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session.clone());

    let err = client
        .send_message("c404", "hello")
        .await
        .expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.user_message(), "Conversation not found");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn send_message_returns_the_assistant_reply() {
    let (base, server) = spawn_http_server(vec![ScriptedResponse::json(
        201,
        message_json("m2", "c1", "assistant", "hi there"),
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session);

    let reply = client.send_message("c1", "hello").await.expect("send");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "hi there");

    let requests = server.await.expect("server task");
    assert_eq!(
        requests[0].request_line,
        "POST /api/conversations/c1/messages HTTP/1.1"
    );
    assert_eq!(requests[0].json(), json!({ "content": "hello" }));
}

#[tokio::test]
async fn message_page_uses_limit_and_cursor() {
    let (base, server) = spawn_http_server(vec![ScriptedResponse::json(
        200,
        json!({ "items": [message_json("m1", "c1", "user", "hey")], "has_more": true }),
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session);

    let page = client
        .messages("c1", 20, Some("m9"))
        .await
        .expect("page should load");
    assert!(page.has_more);
    assert_eq!(page.items.len(), 1);

    let requests = server.await.expect("server task");
    assert_eq!(
        requests[0].request_line,
        "GET /api/conversations/c1/messages?limit=20&before=m9 HTTP/1.1"
    );
}

#[tokio::test]
async fn tts_returns_raw_audio() {
    let (base, _server) = spawn_http_server(vec![ScriptedResponse::bytes(
        200,
        "audio/mpeg",
        b"ID3\x04audio",
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session);

    let audio = client
        .text_to_speech(&crate::api::models::TtsRequest {
            text: "hello".to_string(),
            voice_id: "v1".to_string(),
        })
        .await
        .expect("tts should succeed");
    assert_eq!(audio, b"ID3\x04audio");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (base, _server) = spawn_http_server(vec![ScriptedResponse::bytes(
        200,
        "application/json",
        b"{not json",
    )])
    .await;
    let (session, _) = memory_session(Some(("a1", "r1")));
    let client = ApiClient::new(base, session);

    let err = client.conversation("c1").await.expect_err("should fail");
    assert!(matches!(err, ApiError::Decode { ref endpoint, .. } if endpoint == "conversations/c1"));
}
