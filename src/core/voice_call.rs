use tracing::{info, warn};

use crate::api::models::VoiceCallSession;
use crate::api::{ApiClient, ApiResult};
use crate::core::store::{VoiceCallStatus, VoiceStore};

pub const CONNECT_FAILED: &str = "Unable to establish voice connection";

/// Drives the voice call lifecycle against the server and mirrors it in a
/// [`VoiceStore`].
#[derive(Clone)]
pub struct VoiceCall {
    api: ApiClient,
    store: VoiceStore,
}

impl VoiceCall {
    pub fn new(api: ApiClient, store: VoiceStore) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &VoiceStore {
        &self.store
    }

    pub async fn start(&self, conversation_id: &str) -> ApiResult<VoiceCallSession> {
        self.store.set_status(VoiceCallStatus::Connecting);
        match self.api.start_voice_call(conversation_id).await {
            Ok(session) => {
                info!(session_id = %session.session_id, conversation_id, "voice call started");
                self.store.start_call(session.session_id.clone());
                self.store.set_status(VoiceCallStatus::Active);
                Ok(session)
            }
            Err(err) => {
                warn!(conversation_id, error = %err, "voice call failed to start");
                self.store.set_error(Some(CONNECT_FAILED.to_string()));
                Err(err)
            }
        }
    }

    /// Hang up. The local call state is reset even when the server call fails.
    pub async fn end(&self) -> ApiResult<()> {
        let result = match self.store.session_id() {
            Some(session_id) => self.api.end_voice_call(&session_id).await,
            None => Ok(()),
        };
        if let Err(err) = &result {
            warn!(error = %err, "ending voice call on server failed");
        }
        self.store.end_call();
        result
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::utils::test_utils::{memory_session, spawn_http_server, ScriptedResponse};

    #[tokio::test]
    async fn start_then_end_walks_the_status_machine() {
        let (base, server) = spawn_http_server(vec![
            ScriptedResponse::json(
                200,
                json!({ "session_id": "s1", "conversation_id": "c1", "ws_url": null }),
            ),
            ScriptedResponse::json(200, json!({ "message": "ended" })),
        ])
        .await;
        let (session, _) = memory_session(Some(("a1", "r1")));
        let call = VoiceCall::new(ApiClient::new(base, session), VoiceStore::new());

        call.start("c1").await.expect("start");
        let state = call.store().snapshot();
        assert_eq!(state.status, VoiceCallStatus::Active);
        assert_eq!(state.session_id.as_deref(), Some("s1"));

        call.store().toggle_mute();
        call.store().set_duration(42);
        call.end().await.expect("end");
        let state = call.store().snapshot();
        assert_eq!(state.status, VoiceCallStatus::Ended);
        assert!(!state.is_muted);
        assert_eq!(state.duration, 0);

        let requests = server.await.expect("server task");
        assert_eq!(
            requests[0].request_line,
            "POST /api/voice/call/c1/start HTTP/1.1"
        );
        assert_eq!(requests[1].request_line, "POST /api/voice/call/s1/end HTTP/1.1");
    }

    #[tokio::test]
    async fn failed_start_records_error() {
        let (base, _server) = spawn_http_server(vec![ScriptedResponse::json(
            503,
            json!({ "detail": "voice offline" }),
        )])
        .await;
        let (session, _) = memory_session(Some(("a1", "r1")));
        let call = VoiceCall::new(ApiClient::new(base, session), VoiceStore::new());

        assert!(call.start("c1").await.is_err());
        let state = call.store().snapshot();
        assert_eq!(state.status, VoiceCallStatus::Error);
        assert_eq!(state.error_message.as_deref(), Some(CONNECT_FAILED));
    }

    #[tokio::test]
    async fn end_resets_store_even_when_server_fails() {
        let (base, _server) = spawn_http_server(vec![ScriptedResponse::json(
            500,
            json!({ "detail": "boom" }),
        )])
        .await;
        let (session, _) = memory_session(Some(("a1", "r1")));
        let store = VoiceStore::new();
        store.start_call("s9");
        let call = VoiceCall::new(ApiClient::new(base, session), store.clone());

        assert!(call.end().await.is_err());
        assert_eq!(store.snapshot().status, VoiceCallStatus::Ended);
        assert_eq!(store.session_id(), None);
    }
}
