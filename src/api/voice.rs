use reqwest::Method;

use super::{ApiClient, ApiResult};
use crate::api::models::{TtsRequest, VoiceCallSession, VoiceProfile};

impl ApiClient {
    pub async fn voice_profile(&self, character_id: &str) -> ApiResult<VoiceProfile> {
        self.get_json(&format!("voice/profile/{character_id}"), &[])
            .await
    }

    pub async fn create_voice_profile(
        &self,
        character_id: &str,
        profile: &VoiceProfile,
    ) -> ApiResult<VoiceProfile> {
        self.send_json(
            Method::POST,
            &format!("voice/profile/{character_id}"),
            Some(profile),
        )
        .await
    }

    pub async fn start_voice_call(&self, conversation_id: &str) -> ApiResult<VoiceCallSession> {
        self.send_json::<(), _>(
            Method::POST,
            &format!("voice/call/{conversation_id}/start"),
            None,
        )
        .await
    }

    pub async fn end_voice_call(&self, session_id: &str) -> ApiResult<()> {
        self.send_unit(Method::POST, &format!("voice/call/{session_id}/end"))
            .await
    }

    /// Synthesized speech, returned as the raw audio body.
    pub async fn text_to_speech(&self, request: &TtsRequest) -> ApiResult<Vec<u8>> {
        let response = self
            .execute("voice/tts", |http, url| http.post(url).json(request))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }
}
