use reqwest::Method;

use super::{ApiClient, ApiResult};
use crate::api::models::{
    Character, CharacterCreateRequest, CharacterListParams, CharacterUpdateRequest, LikeStatus,
    Page, PersonalityTemplate,
};

impl ApiClient {
    pub async fn list_characters(&self, params: &CharacterListParams) -> ApiResult<Page<Character>> {
        self.get_json("characters", &params.to_query()).await
    }

    pub async fn character(&self, id: &str) -> ApiResult<Character> {
        self.get_json(&format!("characters/{id}"), &[]).await
    }

    pub async fn create_character(&self, request: &CharacterCreateRequest) -> ApiResult<Character> {
        self.send_json(Method::POST, "characters", Some(request)).await
    }

    pub async fn update_character(
        &self,
        id: &str,
        request: &CharacterUpdateRequest,
    ) -> ApiResult<Character> {
        self.send_json(Method::PUT, &format!("characters/{id}"), Some(request))
            .await
    }

    pub async fn delete_character(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &format!("characters/{id}"))
            .await
    }

    /// Toggles public visibility; the server answers with the updated character.
    pub async fn publish_character(&self, id: &str) -> ApiResult<Character> {
        self.send_json::<(), _>(Method::POST, &format!("characters/{id}/publish"), None)
            .await
    }

    pub async fn clone_character(&self, id: &str) -> ApiResult<Character> {
        self.send_json::<(), _>(Method::POST, &format!("characters/{id}/clone"), None)
            .await
    }

    pub async fn like_character(&self, id: &str) -> ApiResult<LikeStatus> {
        self.send_json::<(), _>(Method::POST, &format!("characters/{id}/like"), None)
            .await
    }

    pub async fn unlike_character(&self, id: &str) -> ApiResult<LikeStatus> {
        self.send_json::<(), _>(Method::DELETE, &format!("characters/{id}/like"), None)
            .await
    }

    pub async fn personality_templates(&self) -> ApiResult<Vec<PersonalityTemplate>> {
        self.get_json("characters/personality-templates", &[]).await
    }
}
